//! DQN agent implemented with candle.
use super::{config::DqnConfig, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{track, NamedTensors, OutDim},
};
use adqn_async_trainer::SyncModel;
use adqn_core::{
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    Agent, Obs, OptOutcome,
};
use anyhow::Result;
use candle_core::{shape::D, Device, Tensor};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};

#[allow(clippy::upper_case_acronyms)]
/// Double DQN agent trained with prioritized replay.
///
/// The online network selects the greedy next action and the target network
/// evaluates it. The loss is the mean of squared TD errors weighted by the
/// importance sampling weights of the batch.
pub struct Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) gamma: f64,
    pub(in crate::dqn) tau: f64,
    pub(in crate::dqn) max_grad_norm: f64,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
}

impl<Q> Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn obs_tensor(&self, obs: &[u8], [b, c, h, w]: [usize; 4]) -> Result<Tensor> {
        Ok(Tensor::from_slice(obs, (b, c, h, w), &self.device)?)
    }

    fn vec_tensor(&self, v: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(v, (v.len(),), &self.device)?)
    }

    fn update_critic(&mut self, batch: &TransitionBatch) -> Result<OptOutcome> {
        let shape = batch.obs_batch_shape();
        let obs = self.obs_tensor(&batch.obs, shape)?;
        let next_obs = self.obs_tensor(&batch.next_obs, shape)?;
        let act = Tensor::from_slice(&batch.act, (batch.len(), 1), &self.device)?;
        let reward = self.vec_tensor(&batch.reward)?;
        let is_not_done = self.vec_tensor(&batch.is_done)?.affine(-1.0, 1.0)?;
        let weight = self.vec_tensor(&batch.weight)?;

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let next_act = self
                .qnet
                .forward(&next_obs)?
                .detach()
                .argmax_keepdim(D::Minus1)?;
            let q = self
                .qnet_tgt
                .forward(&next_obs)?
                .gather(&next_act, D::Minus1)?
                .squeeze(D::Minus1)?;
            (reward + ((is_not_done * self.gamma)? * q)?)?.detach()
        };

        let td_errs = (tgt - &pred)?;
        let loss = (weight * td_errs.sqr()?)?.mean_all()?;
        let grad_norm = self.qnet.backward_step(&loss, self.max_grad_norm)?;
        self.n_opts += 1;

        let td_errs = td_errs.detach().to_device(&Device::Cpu)?.to_vec1::<f32>()?;
        let record = Record::from_slice(&[
            ("losses/td_loss", RecordValue::Scalar(loss.to_scalar::<f32>()?)),
            (
                "losses/q_values",
                RecordValue::Scalar(pred.detach().mean_all()?.to_scalar::<f32>()?),
            ),
            ("losses/grad_norm", RecordValue::Scalar(grad_norm)),
        ]);

        Ok(OptOutcome { td_errs, record })
    }
}

impl<Q> Agent for Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent. The target network starts as a copy of the online network.
    fn build(config: Self::Config) -> Result<Self> {
        let device: Device = config.device.unwrap_or(crate::Device::Cpu).try_into()?;
        let qnet = DqnModel::build(config.model_config.clone(), device.clone())?;
        let qnet_tgt = DqnModel::build(config.model_config, device.clone())?;
        NamedTensors::copy_from(qnet.get_varmap())?.copy_to(qnet_tgt.get_varmap())?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            gamma: config.gamma,
            tau: config.tau,
            max_grad_norm: config.max_grad_norm,
            device,
            n_opts: 0,
        })
    }

    fn action_values(&self, obs: &Obs) -> Result<Vec<f32>> {
        let [c, h, w] = obs.shape();
        let obs = self.obs_tensor(obs.as_slice(), [1, c, h, w])?;
        let q = self.qnet.forward(&obs)?.detach().squeeze(0)?;
        Ok(q.to_device(&Device::Cpu)?.to_vec1::<f32>()?)
    }

    fn opt(&mut self, batch: &TransitionBatch) -> Result<OptOutcome> {
        self.update_critic(batch)
    }

    fn sync_target(&mut self) -> Result<()> {
        if self.tau >= 1.0 {
            NamedTensors::copy_from(self.qnet.get_varmap())?.copy_to(self.qnet_tgt.get_varmap())
        } else {
            track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), self.tau)
        }
    }

    fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}

impl<Q> SyncModel for Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    type ModelInfo = NamedTensors;

    fn model_info(&self) -> Result<(usize, Self::ModelInfo)> {
        Ok((self.n_opts, NamedTensors::copy_from(self.qnet.get_varmap())?))
    }

    fn sync_model(&mut self, model_info: &Self::ModelInfo) -> Result<()> {
        model_info.copy_to(self.qnet.get_varmap())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dqn::DqnModelConfig,
        mlp::{Mlp, MlpConfig},
        opt::OptimizerConfig,
    };
    use adqn_core::replay_buffer::SampleIx;
    use tempdir::TempDir;

    const N_ACTIONS: usize = 3;

    fn config() -> DqnConfig<MlpConfig> {
        let model_config = DqnModelConfig::default()
            .q_config(MlpConfig::new(16, vec![8], N_ACTIONS as _))
            .opt_config(OptimizerConfig::Adam { lr: 1e-2 });
        DqnConfig::default()
            .model_config(model_config)
            .device(crate::Device::Cpu)
    }

    fn batch(n: usize) -> TransitionBatch {
        TransitionBatch {
            obs_shape: [1, 4, 4],
            obs: (0..n * 16).map(|i| (i * 7 % 256) as u8).collect(),
            act: (0..n).map(|i| (i % N_ACTIONS) as u32).collect(),
            reward: (0..n).map(|i| i as f32).collect(),
            next_obs: (0..n * 16).map(|i| (i * 13 % 256) as u8).collect(),
            is_done: (0..n).map(|i| (i % 2) as f32).collect(),
            ixs: (0..n)
                .map(|i| SampleIx {
                    slot: i,
                    generation: i as u64,
                })
                .collect(),
            weight: vec![1.0; n],
        }
    }

    fn params(agent: &Dqn<Mlp>, target: bool) -> Vec<f32> {
        let varmap = match target {
            false => agent.qnet.get_varmap(),
            true => agent.qnet_tgt.get_varmap(),
        };
        let nt = NamedTensors::copy_from(varmap).unwrap();
        let mut names = nt.named_tensors.keys().collect::<Vec<_>>();
        names.sort();
        names
            .into_iter()
            .flat_map(|k| nt.named_tensors[k].flatten_all().unwrap().to_vec1::<f32>().unwrap())
            .collect()
    }

    #[test]
    fn test_target_is_frozen_between_syncs() -> Result<()> {
        let mut agent = Dqn::<Mlp>::build(config())?;
        let batch = batch(8);
        assert_eq!(params(&agent, false), params(&agent, true));

        for i in 1..=6 {
            let target_before = params(&agent, true);
            let outcome = agent.opt(&batch)?;
            assert_eq!(outcome.td_errs.len(), 8);
            assert!(outcome.td_errs.iter().all(|td| td.is_finite()));
            assert_eq!(params(&agent, true), target_before);
            assert_ne!(params(&agent, false), params(&agent, true));

            if i % 3 == 0 {
                agent.sync_target()?;
                assert_eq!(params(&agent, false), params(&agent, true));
            }
        }
        assert_eq!(agent.n_opts(), 6);
        Ok(())
    }

    #[test]
    fn test_opt_record() -> Result<()> {
        let mut agent = Dqn::<Mlp>::build(config())?;
        let outcome = agent.opt(&batch(4))?;
        let loss = outcome.record.get_scalar("losses/td_loss")?;
        let mean_sq = outcome.td_errs.iter().map(|td| td * td).sum::<f32>() / 4.0;
        assert!((loss - mean_sq).abs() < 1e-3 * mean_sq.max(1.0));
        assert!(outcome.record.get_scalar("losses/q_values").is_ok());
        Ok(())
    }

    #[test]
    fn test_sync_model() -> Result<()> {
        let mut learner = Dqn::<Mlp>::build(config())?;
        let mut actor = Dqn::<Mlp>::build(config())?;
        let obs = Obs::new([1, 4, 4], (0..16).collect())?;
        learner.opt(&batch(8))?;
        assert_ne!(learner.action_values(&obs)?, actor.action_values(&obs)?);

        let (opt_steps, info) = learner.model_info()?;
        assert_eq!(opt_steps, 1);
        actor.sync_model(&info)?;
        let q = actor.action_values(&obs)?;
        assert_eq!(q.len(), N_ACTIONS);
        assert_eq!(learner.action_values(&obs)?, q);

        // Later updates of the learner do not leak into the snapshot
        learner.opt(&batch(8))?;
        actor.sync_model(&info)?;
        assert_eq!(actor.action_values(&obs)?, q);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = Dqn::<Mlp>::build(config())?;
        agent.opt(&batch(8))?;
        agent.save_params(dir.path())?;

        let mut agent_ = Dqn::<Mlp>::build(config())?;
        agent_.load_params(dir.path())?;
        assert_eq!(params(&agent, false), params(&agent_, false));
        assert_eq!(params(&agent, true), params(&agent_, true));
        Ok(())
    }
}
