#![warn(missing_docs)]
//! Core types of the asynchronous DQN trainer.
//!
//! * [`Env`] and [`Agent`] are the seams between the training loops and the
//!   environment and network implementations.
//! * [`replay_buffer::PrioritizedReplayBuffer`] is the shared prioritized store.
//! * [`schedule::linear_schedule`] drives both the exploration rate and the
//!   importance-sampling exponent.
pub mod error;
pub mod explorer;
pub mod record;
pub mod replay_buffer;
pub mod schedule;

mod base;
pub use base::{ActionSpace, Agent, Env, EpisodeInfo, Obs, OptOutcome, Step, Transition};
pub use error::AdqnError;
