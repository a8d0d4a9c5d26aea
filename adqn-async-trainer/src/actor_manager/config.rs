use adqn_core::{explorer::EpsilonGreedy, AdqnError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Epsilon-greedy exploration shared by all actors.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExplorationConfig {
    /// Epsilon at the start of training. The default value is 1.0.
    pub start_e: f64,

    /// Epsilon after annealing. The default value is 0.02.
    pub end_e: f64,

    /// Fraction of `total_timesteps` over which epsilon is annealed. The default value is 0.1.
    pub exploration_fraction: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            start_e: 1.0,
            end_e: 0.02,
            exploration_fraction: 0.1,
        }
    }
}

impl ExplorationConfig {
    /// Builds the explorer for a run of `total_timesteps`.
    pub fn build(&self, total_timesteps: u64) -> EpsilonGreedy {
        EpsilonGreedy::new(
            self.start_e,
            self.end_e,
            self.exploration_fraction,
            total_timesteps,
        )
    }
}

/// Configuration of [`ActorManager`](super::ActorManager).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActorManagerConfig {
    /// Capacity of the channel carrying episode statistics to the monitor.
    ///
    /// Statistics are dropped when the channel is full. The default value is 1000.
    pub stats_channel_capacity: usize,

    /// Base seed. Actor `i` uses `seed + i`.
    pub seed: i64,

    /// Exploration.
    pub exploration: ExplorationConfig,
}

impl Default for ActorManagerConfig {
    fn default() -> Self {
        Self {
            stats_channel_capacity: 1000,
            seed: 2,
            exploration: ExplorationConfig::default(),
        }
    }
}

impl ActorManagerConfig {
    /// Sets the capacity of the stats channel.
    pub fn stats_channel_capacity(mut self, v: usize) -> Self {
        self.stats_channel_capacity = v;
        self
    }

    /// Sets the base seed.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the exploration.
    pub fn exploration(mut self, v: ExplorationConfig) -> Self {
        self.exploration = v;
        self
    }

    /// Checks values.
    pub fn validate(&self) -> Result<(), AdqnError> {
        let e = &self.exploration;
        if self.stats_channel_capacity == 0 {
            return Err(AdqnError::InvalidConfig(
                "stats_channel_capacity must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&e.start_e) || !(0.0..=1.0).contains(&e.end_e) {
            return Err(AdqnError::InvalidConfig(format!(
                "epsilon must be in [0, 1], got start_e = {}, end_e = {}",
                e.start_e, e.end_e
            )));
        }
        if !(e.exploration_fraction >= 0.0) {
            return Err(AdqnError::InvalidConfig(format!(
                "exploration_fraction must be non-negative, got {}",
                e.exploration_fraction
            )));
        }
        Ok(())
    }

    /// Constructs [`ActorManagerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorManagerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
