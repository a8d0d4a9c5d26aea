//! Training on a registered environment.
use crate::{
    env::{CatchConfig, CatchEnv, EnvId},
    AdqnConfig,
};
use adqn_async_trainer::{train_async, TrainAsyncStat};
use adqn_candle_agent::{
    cnn::{Cnn, CnnConfig},
    dqn::Dqn,
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    util::OutDim,
    Device,
};
use adqn_core::{record::Recorder, Env};
use anyhow::Result;
use candle_core::Tensor;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, path::Path};

/// Hidden units of the MLP used for small observations.
const MLP_UNITS: [i64; 2] = [128, 128];

/// Trains an agent on `config.gym_id`, saving models in `run_dir`.
///
/// The network is a CNN for `Catch-v0` and an MLP for `CatchSmall-v0`.
pub fn train(config: &AdqnConfig, run_dir: &Path, recorder: &mut dyn Recorder) -> Result<TrainAsyncStat> {
    config.validate()?;
    let env_id: EnvId = config.gym_id.parse()?;
    let env_config = env_id.config();
    let n_actions = CatchEnv::build(&env_config, config.seed)?
        .action_space()
        .n_discrete()? as i64;
    let [c, h, w] = env_config.obs_shape();
    info!(
        "{}: observation shape = {:?}, actions = {}",
        config.gym_id,
        [c, h, w],
        n_actions
    );

    match env_id {
        EnvId::Catch => {
            let q_config = CnnConfig::new(c as _, n_actions);
            train_with::<Cnn>(config, env_config, q_config, run_dir, recorder)
        }
        EnvId::CatchSmall => {
            let q_config = MlpConfig::new((c * h * w) as _, MLP_UNITS.to_vec(), n_actions);
            train_with::<Mlp>(config, env_config, q_config, run_dir, recorder)
        }
    }
}

fn train_with<Q>(
    config: &AdqnConfig,
    env_config: CatchConfig,
    q_config: Q::Config,
    run_dir: &Path,
    recorder: &mut dyn Recorder,
) -> Result<TrainAsyncStat>
where
    Q: SubModel1<Input = Tensor, Output = Tensor> + Send + 'static,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone + Send + 'static,
{
    let device = match config.cuda {
        true => Device::Cuda(0),
        false => Device::Cpu,
    };
    let agent_config = config.dqn_config(q_config).device(device);
    let agent_configs = vec![agent_config.clone().device(Device::Cpu); config.num_actors];

    train_async::<Dqn<Q>, CatchEnv>(
        &agent_config,
        &agent_configs,
        &env_config,
        &config.replay_buffer_config(),
        &config.actor_manager_config(),
        &config.async_trainer_config(run_dir),
        recorder,
    )
}
