//! Configuration of a training run.
use adqn_async_trainer::{ActorManagerConfig, AsyncTrainerConfig, ExplorationConfig};
use adqn_candle_agent::{
    dqn::{DqnConfig, DqnModelConfig},
    opt::OptimizerConfig,
    util::OutDim,
};
use adqn_core::{
    replay_buffer::{PerConfig, ReplayBufferConfig},
    AdqnError,
};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// All hyperparameters of a training run. Saved as `config.yaml` in the run directory.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AdqnConfig {
    pub gym_id: String,
    pub exp_name: String,
    pub learning_rate: f64,
    pub seed: i64,
    pub total_timesteps: u64,
    pub num_actors: usize,
    pub buffer_size: usize,
    pub pr_alpha: f32,
    pub pr_beta0: f64,
    pub pr_eps: f32,
    pub gamma: f64,
    pub target_network_frequency: usize,
    pub max_grad_norm: f64,
    pub batch_size: usize,
    pub start_e: f64,
    pub end_e: f64,
    pub exploration_fraction: f64,
    pub learning_starts: u64,
    pub train_frequency: u64,
    pub record_interval: usize,
    pub save_interval: usize,
    pub cuda: bool,
    pub model_dir: String,
}

impl Default for AdqnConfig {
    fn default() -> Self {
        Self {
            gym_id: "Catch-v0".to_string(),
            exp_name: "adqn".to_string(),
            learning_rate: 1e-4,
            seed: 2,
            total_timesteps: 10_000_000,
            num_actors: 4,
            buffer_size: 100_000,
            pr_alpha: 0.6,
            pr_beta0: 0.4,
            pr_eps: 1e-6,
            gamma: 0.99,
            target_network_frequency: 1000,
            max_grad_norm: 0.5,
            batch_size: 32,
            start_e: 1.0,
            end_e: 0.02,
            exploration_fraction: 0.10,
            learning_starts: 80_000,
            train_frequency: 4,
            record_interval: 100,
            save_interval: 100_000,
            cuda: false,
            model_dir: "runs".to_string(),
        }
    }
}

impl AdqnConfig {
    /// Checks values that the component configurations do not check.
    pub fn validate(&self) -> Result<(), AdqnError> {
        let err = |msg: String| Err(AdqnError::InvalidConfig(msg));
        if self.num_actors == 0 {
            return err("num_actors must be positive".into());
        }
        if self.buffer_size == 0 {
            return err("buffer_size must be positive".into());
        }
        if !(self.learning_rate > 0.0) {
            return err(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(self.pr_alpha >= 0.0) || !(self.pr_eps > 0.0) {
            return err(format!(
                "pr_alpha must be non-negative and pr_eps positive, got {} and {}",
                self.pr_alpha, self.pr_eps
            ));
        }
        if !(self.max_grad_norm > 0.0) {
            return err(format!("max_grad_norm must be positive, got {}", self.max_grad_norm));
        }
        Ok(())
    }

    /// Name of the run directory, `<gym_id>__<exp_name>__<seed>__<unix time>`.
    pub fn run_name(&self) -> String {
        format!(
            "{}__{}__{}__{}",
            self.gym_id,
            self.exp_name,
            self.seed,
            chrono::Utc::now().timestamp()
        )
    }

    pub fn replay_buffer_config(&self) -> ReplayBufferConfig {
        ReplayBufferConfig::default()
            .capacity(self.buffer_size)
            .seed(self.seed as u64)
            .per_config(PerConfig::default().alpha(self.pr_alpha).eps(self.pr_eps))
    }

    pub fn actor_manager_config(&self) -> ActorManagerConfig {
        ActorManagerConfig::default()
            .seed(self.seed)
            .exploration(ExplorationConfig {
                start_e: self.start_e,
                end_e: self.end_e,
                exploration_fraction: self.exploration_fraction,
            })
    }

    /// Models are saved in `run_dir`.
    pub fn async_trainer_config(&self, run_dir: &Path) -> AsyncTrainerConfig {
        AsyncTrainerConfig::default()
            .total_timesteps(self.total_timesteps)
            .learning_starts(self.learning_starts)
            .train_frequency(self.train_frequency)
            .batch_size(self.batch_size)
            .target_network_frequency(self.target_network_frequency)
            .pr_beta0(self.pr_beta0)
            .record_interval(self.record_interval)
            .save_interval(self.save_interval)
            .model_dir(run_dir.to_string_lossy())
    }

    pub fn dqn_config<Q>(&self, q_config: Q) -> DqnConfig<Q>
    where
        Q: DeserializeOwned + Serialize + OutDim,
    {
        let model_config = DqnModelConfig::default()
            .q_config(q_config)
            .opt_config(OptimizerConfig::Adam {
                lr: self.learning_rate,
            });
        DqnConfig::default()
            .model_config(model_config)
            .gamma(self.gamma)
            .max_grad_norm(self.max_grad_norm)
    }

    /// Constructs [`AdqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AdqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_adqn_config() -> Result<()> {
        let config = AdqnConfig {
            gym_id: "CatchSmall-v0".into(),
            total_timesteps: 5000,
            ..Default::default()
        };
        let dir = TempDir::new("adqn_config")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        assert_eq!(AdqnConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_component_configs() {
        let config = AdqnConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.actor_manager_config().validate().is_ok());
        let trainer = config.async_trainer_config(Path::new("runs/x"));
        assert!(trainer.validate().is_ok());
        assert_eq!(trainer.learning_starts, 80_000);
        assert_eq!(trainer.model_dir.as_deref(), Some("runs/x"));
        assert_eq!(config.replay_buffer_config().per_config.alpha, 0.6);
    }

    #[test]
    fn test_validate() {
        let config = AdqnConfig {
            num_actors: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = AdqnConfig {
            gamma: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_run_name() {
        let name = AdqnConfig::default().run_name();
        assert!(name.starts_with("Catch-v0__adqn__2__"));
    }
}
