//! Environment.
use super::Obs;
use crate::error::AdqnError;
use anyhow::Result;
use std::fmt;

/// Action space of an environment.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionSpace {
    /// `n` actions, `0..n`.
    Discrete(usize),

    /// Continuous actions with the given dimension.
    Box(usize),
}

impl ActionSpace {
    /// Returns the number of actions if the space is discrete.
    pub fn n_discrete(&self) -> Result<usize, AdqnError> {
        match self {
            Self::Discrete(n) if *n > 0 => Ok(*n),
            other => Err(AdqnError::NonDiscreteActionSpace(other.to_string())),
        }
    }
}

impl fmt::Display for ActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discrete(n) => write!(f, "Discrete({})", n),
            Self::Box(d) => write!(f, "Box({})", d),
        }
    }
}

/// Return and length of a finished episode as reported by the environment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeInfo {
    /// Undiscounted sum of rewards.
    pub episode_return: f32,

    /// The number of environment steps.
    pub episode_length: usize,
}

/// Result of an environment step.
#[derive(Clone, Debug)]
pub struct Step {
    /// Observation after the action.
    pub obs: Obs,

    /// Reward.
    pub reward: f32,

    /// `true` if the episode ended with this step.
    pub is_done: bool,

    /// Statistics of the episode, set by environments that track episodes
    /// beyond `is_done`, e.g. life-based termination.
    pub episode: Option<EpisodeInfo>,
}

/// Represents an environment with pixel observations and discrete actions.
///
/// Preprocessing such as frame stacking happens inside implementations.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Action space of the environment.
    fn action_space(&self) -> ActionSpace;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Obs>;

    /// Performs an environment step.
    fn step(&mut self, act: usize) -> Result<Step>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_n_discrete() {
        assert_eq!(ActionSpace::Discrete(4).n_discrete().unwrap(), 4);
        assert!(matches!(
            ActionSpace::Box(2).n_discrete(),
            Err(AdqnError::NonDiscreteActionSpace(_))
        ));
        assert!(ActionSpace::Discrete(0).n_discrete().is_err());
    }
}
