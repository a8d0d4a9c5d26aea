//! Actor.
mod base;
mod stat;
pub use base::Actor;
pub use stat::{actor_stats_fmt, ActorStat};
