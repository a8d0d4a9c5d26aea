//! Asynchronous prioritized DQN.
//!
//! The workspace consists of the following crates:
//!
//! * [adqn-core](adqn_core) provides the environment and agent traits, records,
//!   the prioritized replay buffer and exploration schedules.
//! * [adqn-async-trainer](adqn_async_trainer) runs actors and a learner on
//!   threads around a shared replay buffer.
//! * [adqn-candle-agent](adqn_candle_agent) implements double DQN with
//!   [candle](https://crates.io/crates/candle-core).
//! * [adqn-tensorboard](adqn_tensorboard) writes metrics for tensorboard.
//! * This crate has the `adqn` binary, the configuration of a run and the Catch
//!   environments.
pub mod config;
pub mod env;
mod train;
pub use config::AdqnConfig;
pub use train::train;
