//! Prioritized experience replay.
//!
//! [`PrioritizedReplayBuffer`] is a ring buffer of [`Transition`](crate::Transition)s
//! with a sum tree over `priority^alpha`. Transitions are sampled in proportion to
//! that mass with stratified sampling, and each sampled index carries the
//! generation of its slot, so priority updates for slots overwritten in the
//! meantime are ignored.
mod base;
mod batch;
mod config;
mod sum_tree;
pub use base::PrioritizedReplayBuffer;
pub use batch::{SampleIx, TransitionBatch};
pub use config::{PerConfig, ReplayBufferConfig, WeightNormalizer};
pub use sum_tree::SumTree;
