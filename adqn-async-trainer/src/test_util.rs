//! Environment and agent used in tests of this crate.
use crate::{Coordinator, SyncModel};
use adqn_core::{
    record::{Record, RecordValue::Scalar},
    replay_buffer::TransitionBatch,
    ActionSpace, AdqnError, Agent, Env, Obs, OptOutcome, Step, Transition,
};
use anyhow::Result;
use std::{fs::File, io::Write, path::Path, thread, time::Duration};

#[derive(Clone, Debug)]
pub struct TestEnvConfig {
    pub episode_length: usize,
    pub continuous: bool,

    /// The environment built with this seed fails on reset.
    pub failing_seed: Option<i64>,

    /// Paces actors like a real environment, so the learner keeps up with them.
    pub step_delay: Option<Duration>,
}

impl Default for TestEnvConfig {
    fn default() -> Self {
        Self {
            episode_length: 10,
            continuous: false,
            failing_seed: None,
            step_delay: None,
        }
    }
}

/// Walks a counter for a fixed number of steps. The reward is the action.
pub struct TestEnv {
    config: TestEnvConfig,
    seed: i64,
    t: usize,
}

impl TestEnv {
    fn obs(&self) -> Obs {
        Obs::new([1, 1, 4], vec![self.t as u8, 0, 0, 0]).unwrap()
    }
}

impl Env for TestEnv {
    type Config = TestEnvConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            seed,
            t: 0,
        })
    }

    fn action_space(&self) -> ActionSpace {
        match self.config.continuous {
            true => ActionSpace::Box(1),
            false => ActionSpace::Discrete(2),
        }
    }

    fn reset(&mut self) -> Result<Obs> {
        if self.config.failing_seed == Some(self.seed) {
            return Err(AdqnError::Env(format!("reset failed with seed {}", self.seed)).into());
        }
        self.t = 0;
        Ok(self.obs())
    }

    fn step(&mut self, act: usize) -> Result<Step> {
        if let Some(delay) = self.config.step_delay {
            thread::sleep(delay);
        }
        self.t += 1;
        Ok(Step {
            obs: self.obs(),
            reward: act as f32,
            is_done: self.t >= self.config.episode_length,
            episode: None,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct TestAgentConfig {
    /// `opt` fails at this optimization step.
    pub fail_at: Option<usize>,
}

pub struct TestAgent {
    config: TestAgentConfig,
    params: Vec<f32>,
    target: Vec<f32>,
    n_opts: usize,

    /// `n_opts` at each call of `sync_target`.
    pub target_syncs: Vec<usize>,
}

impl Agent for TestAgent {
    type Config = TestAgentConfig;

    fn build(config: Self::Config) -> Result<Self> {
        Ok(Self {
            config,
            params: vec![0.0, 0.0],
            target: vec![0.0, 0.0],
            n_opts: 0,
            target_syncs: vec![],
        })
    }

    fn action_values(&self, _obs: &Obs) -> Result<Vec<f32>> {
        Ok(self.params.clone())
    }

    fn opt(&mut self, batch: &TransitionBatch) -> Result<OptOutcome> {
        if self.config.fail_at == Some(self.n_opts + 1) {
            anyhow::bail!("optimization failed at step {}", self.n_opts + 1);
        }
        let td_errs = batch
            .reward
            .iter()
            .zip(batch.act.iter())
            .map(|(r, a)| r - self.params[*a as usize])
            .collect::<Vec<_>>();
        for (td, a) in td_errs.iter().zip(batch.act.iter()) {
            self.params[*a as usize] += 0.01 * td;
        }
        self.n_opts += 1;
        let loss = td_errs.iter().map(|td| td * td).sum::<f32>() / td_errs.len() as f32;

        Ok(OptOutcome {
            td_errs,
            record: Record::from_slice(&[("losses/td_loss", Scalar(loss))]),
        })
    }

    fn sync_target(&mut self) -> Result<()> {
        self.target = self.params.clone();
        self.target_syncs.push(self.n_opts);
        Ok(())
    }

    fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path.join("params.yaml"))?;
        file.write_all(serde_yaml::to_string(&(&self.params, &self.target))?.as_bytes())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path.join("params.yaml"))?;
        let (params, target) = serde_yaml::from_reader(file)?;
        self.params = params;
        self.target = target;
        Ok(())
    }
}

impl SyncModel for TestAgent {
    type ModelInfo = Vec<f32>;

    fn model_info(&self) -> Result<(usize, Self::ModelInfo)> {
        Ok((self.n_opts, self.params.clone()))
    }

    fn sync_model(&mut self, model_info: &Self::ModelInfo) -> Result<()> {
        self.params = model_info.clone();
        Ok(())
    }
}

/// Pushes `n` transitions of [`TestEnv`] into the replay buffer.
pub fn prefill(coordinator: &Coordinator, n: usize) -> Result<()> {
    for i in 0..n {
        let t = (i % 10) as u8;
        coordinator.push(Transition {
            obs: Obs::new([1, 1, 4], vec![t, 0, 0, 0])?,
            act: i % 2,
            reward: (i % 2) as f32,
            next_obs: Obs::new([1, 1, 4], vec![t + 1, 0, 0, 0])?,
            is_done: t == 9,
        })?;
    }
    Ok(())
}
