//! Utility function.
use crate::{
    actor_stats_fmt, ActorManager, ActorManagerConfig, ActorStat, AsyncTrainStat, AsyncTrainer,
    AsyncTrainerConfig, Coordinator, Monitor, MonitorStat, SyncModel, WeightSlot,
};
use adqn_core::{
    record::Recorder,
    replay_buffer::{PrioritizedReplayBuffer, ReplayBufferConfig},
    AdqnError, Agent, Env,
};
use anyhow::Result;
use crossbeam_channel::{bounded, unbounded};
use log::info;
use std::sync::{Arc, Mutex};

/// Summary of [`train_async`].
#[derive(Clone, Debug)]
pub struct TrainAsyncStat {
    /// Stats of the learner.
    pub trainer: AsyncTrainStat,

    /// Stats of each actor.
    pub actors: Vec<ActorStat>,

    /// Counters of the monitor.
    pub monitor: MonitorStat,
}

impl TrainAsyncStat {
    /// Returns a formatted string.
    pub fn fmt(&self) -> String {
        format!(
            "{}{}episodes, records\n{}, {}\n",
            self.trainer.fmt(),
            actor_stats_fmt(&self.actors),
            self.monitor.n_episodes,
            self.monitor.n_records
        )
    }
}

/// Runs asynchronous training.
///
/// This function runs [`Actor`](crate::Actor)s through an [`ActorManager`] and an
/// [`AsyncTrainer`] on their own threads, while the calling thread runs the
/// [`Monitor`] writing to `recorder`. It returns when all threads have finished.
///
/// * `agent_config` - Configuration of the agent to be trained.
/// * `agent_configs` - Configurations of agents in actors, one per actor.
///   They must share the structure of the model ([`SyncModel::ModelInfo`]).
/// * `env_config` - Configuration of the environment with which transitions are sampled.
/// * `replay_buffer_config` - Configuration of the replay buffer.
/// * `actor_man_config` - Configuration of [`ActorManager`].
/// * `async_trainer_config` - Configuration of [`AsyncTrainer`].
///
/// Invalid configurations and environments without a discrete action space are
/// reported before any thread starts.
pub fn train_async<A, E>(
    agent_config: &A::Config,
    agent_configs: &[A::Config],
    env_config: &E::Config,
    replay_buffer_config: &ReplayBufferConfig,
    actor_man_config: &ActorManagerConfig,
    async_trainer_config: &AsyncTrainerConfig,
    recorder: &mut dyn Recorder,
) -> Result<TrainAsyncStat>
where
    A: Agent + SyncModel + Send + 'static,
    E: Env + 'static,
    A::Config: Send + 'static,
    E::Config: Send + 'static,
{
    actor_man_config.validate()?;
    async_trainer_config.validate()?;
    if agent_configs.is_empty() {
        return Err(AdqnError::InvalidConfig("at least one actor is required".into()).into());
    }
    {
        let env = E::build(env_config, actor_man_config.seed)?;
        let n_actions = env.action_space().n_discrete()?;
        info!("The environment has {} discrete actions", n_actions);
    }

    let total_timesteps = async_trainer_config.total_timesteps;
    let buffer = PrioritizedReplayBuffer::build(replay_buffer_config)?;
    let coordinator = Arc::new(Coordinator::new(buffer, total_timesteps));
    let weight_slot = Arc::new(WeightSlot::new());

    // Creates channels
    let (stats_s, stats_r) = bounded(actor_man_config.stats_channel_capacity);
    let (record_s, record_r) = unbounded();

    // Actors start from the initial weights of the learner
    let mut agent = A::build(agent_config.clone())?;
    let mut trainer = AsyncTrainer::<A>::build(
        async_trainer_config,
        coordinator.clone(),
        weight_slot.clone(),
        record_s,
    );
    trainer.publish(&agent)?;

    // guard for initialization of envs in multiple threads
    let guard_init_env = Arc::new(Mutex::new(true));

    let mut actors = ActorManager::<A, E>::build(
        actor_man_config,
        agent_configs,
        env_config,
        total_timesteps,
        coordinator.clone(),
        weight_slot,
        stats_s,
    );
    // The learner starts before the actors so that it reaches the training gate
    // before the first transitions arrive.
    actors.register();
    let learner = {
        let coordinator = coordinator.clone();
        std::thread::Builder::new()
            .name("learner".into())
            .spawn(move || {
                let stat = trainer.train(&mut agent);
                coordinator.stop();
                stat
            })
    };
    let learner = match learner {
        Ok(learner) => learner,
        Err(e) => {
            actors.stop_and_join();
            return Err(e.into());
        }
    };
    if let Err(e) = actors.run(guard_init_env) {
        coordinator.stop();
        let _ = learner.join();
        actors.stop_and_join();
        return Err(e);
    }

    let monitor = Monitor::new(recorder, coordinator.clone()).run(stats_r, record_r);

    let trainer = learner
        .join()
        .map_err(|_| AdqnError::Poisoned("learner thread"));
    let actors = actors.stop_and_join();
    info!("Stats of generated samples in actors");
    info!("{}", actor_stats_fmt(&actors));

    let trainer = trainer??;
    info!("Stats of async trainer");
    info!("{}", trainer.fmt());

    Ok(TrainAsyncStat {
        trainer,
        actors,
        monitor,
    })
}
