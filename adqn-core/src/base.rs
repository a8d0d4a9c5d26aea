//! Core functionalities.
mod agent;
mod env;
mod obs;
mod transition;
pub use agent::{Agent, OptOutcome};
pub use env::{ActionSpace, Env, EpisodeInfo, Step};
pub use obs::Obs;
pub use transition::Transition;
