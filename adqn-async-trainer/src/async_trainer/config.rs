use adqn_core::AdqnError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`AsyncTrainer`](crate::AsyncTrainer).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AsyncTrainerConfig {
    /// The number of environment steps collected by all actors.
    pub total_timesteps: u64,

    /// Optimization starts once the global step exceeds this value.
    pub learning_starts: u64,

    /// The number of environment steps per optimization step.
    pub train_frequency: u64,

    /// Batch size.
    pub batch_size: usize,

    /// Interval of synchronizing the target network in optimization steps.
    pub target_network_frequency: usize,

    /// Interval of publishing weights to actors in optimization steps.
    pub publish_interval: usize,

    /// Initial exponent of importance sampling weights, annealed to 1.0.
    pub pr_beta0: f64,

    /// Interval of recording in optimization steps.
    pub record_interval: usize,

    /// Interval of saving the model in optimization steps.
    pub save_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for AsyncTrainerConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 10_000_000,
            learning_starts: 80_000,
            train_frequency: 4,
            batch_size: 32,
            target_network_frequency: 1000,
            publish_interval: 1,
            pr_beta0: 0.4,
            record_interval: 100,
            save_interval: 100_000,
            model_dir: None,
        }
    }
}

impl AsyncTrainerConfig {
    /// Sets the number of environment steps.
    pub fn total_timesteps(mut self, v: u64) -> Self {
        self.total_timesteps = v;
        self
    }

    /// Sets the number of environment steps before optimization starts.
    pub fn learning_starts(mut self, v: u64) -> Self {
        self.learning_starts = v;
        self
    }

    /// Sets the number of environment steps per optimization step.
    pub fn train_frequency(mut self, v: u64) -> Self {
        self.train_frequency = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the interval of target network synchronization.
    pub fn target_network_frequency(mut self, v: usize) -> Self {
        self.target_network_frequency = v;
        self
    }

    /// Sets the interval of weight publication.
    pub fn publish_interval(mut self, v: usize) -> Self {
        self.publish_interval = v;
        self
    }

    /// Sets the initial exponent of importance sampling weights.
    pub fn pr_beta0(mut self, v: f64) -> Self {
        self.pr_beta0 = v;
        self
    }

    /// Sets the interval of recording.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Sets the interval of saving the model.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory the trained model being saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Checks values.
    pub fn validate(&self) -> Result<(), AdqnError> {
        let positive: [(&str, u64); 7] = [
            ("total_timesteps", self.total_timesteps),
            ("train_frequency", self.train_frequency),
            ("batch_size", self.batch_size as u64),
            ("target_network_frequency", self.target_network_frequency as u64),
            ("publish_interval", self.publish_interval as u64),
            ("record_interval", self.record_interval as u64),
            ("save_interval", self.save_interval as u64),
        ];
        for (name, v) in positive.iter() {
            if *v == 0 {
                return Err(AdqnError::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        if !(0.0..=1.0).contains(&self.pr_beta0) {
            return Err(AdqnError::InvalidConfig(format!(
                "pr_beta0 must be in [0, 1], got {}",
                self.pr_beta0
            )));
        }
        Ok(())
    }

    /// Constructs [`AsyncTrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AsyncTrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
