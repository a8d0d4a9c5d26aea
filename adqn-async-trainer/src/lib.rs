//! Asynchronous DQN training on a single machine.
//!
//! Threads and the state they share:
//!
//! * [`Actor`]s (one thread each) step their environments and push transitions
//!   into the replay buffer owned by the [`Coordinator`]. A push also increments
//!   the global step inside the same critical section.
//! * The [`AsyncTrainer`] (one thread) samples batches from the same buffer,
//!   optimizes the agent, writes back priorities and publishes weights to the
//!   [`WeightSlot`].
//! * The [`Monitor`] (the calling thread) writes episode statistics from the
//!   actors and records from the learner to a
//!   [`Recorder`](adqn_core::record::Recorder).
//!
//! [`train_async`] wires these together.
mod actor;
mod actor_manager;
mod async_trainer;
mod coordinator;
mod messages;
mod monitor;
mod sync_model;
mod util;
mod weight_slot;
pub use actor::{actor_stats_fmt, Actor, ActorStat};
pub use actor_manager::{ActorManager, ActorManagerConfig, ExplorationConfig};
pub use async_trainer::{AsyncTrainStat, AsyncTrainer, AsyncTrainerConfig};
pub use coordinator::{ActorRegistration, Coordinator};
pub use messages::EpisodeStat;
pub use monitor::{Monitor, MonitorStat};
pub use sync_model::SyncModel;
pub use util::{train_async, TrainAsyncStat};
pub use weight_slot::{ModelSnapshot, WeightSlot};

#[cfg(test)]
mod test_util;
