use crate::{Coordinator, EpisodeStat, SyncModel, WeightSlot};
use adqn_core::{explorer::EpsilonGreedy, Agent, AdqnError, Env, EpisodeInfo, Transition};
use anyhow::Result;
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, info, warn};
use rand::{rngs::SmallRng, SeedableRng};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
    time::Instant,
};
use super::ActorStat;

enum ActorState {
    Running,

    // The episode has ended. Statistics are `None` when the environment reports
    // episodes by itself and this termination was not the end of one.
    EpisodeReset(Option<EpisodeInfo>),
}

/// Runs interaction between an [`Agent`] and an [`Env`], pushing transitions
/// into the replay buffer of the [`Coordinator`].
///
/// Actions are epsilon-greedy with respect to a local copy of the model, which is
/// refreshed whenever the learner publishes a newer snapshot to the [`WeightSlot`].
pub struct Actor<A, E>
where
    A: Agent + SyncModel,
    E: Env,
{
    id: usize,
    agent_config: A::Config,
    env_config: E::Config,
    explorer: EpsilonGreedy,
    env_seed: i64,
    coordinator: Arc<Coordinator>,
    weight_slot: Arc<WeightSlot<A::ModelInfo>>,
    stats_sender: Sender<EpisodeStat>,
    phantom: PhantomData<fn() -> E>,
}

impl<A, E> Actor<A, E>
where
    A: Agent + SyncModel,
    E: Env,
{
    /// Builds an actor.
    ///
    /// `env_seed` also seeds the random number generator of the explorer.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        id: usize,
        agent_config: A::Config,
        env_config: E::Config,
        explorer: EpsilonGreedy,
        env_seed: i64,
        coordinator: Arc<Coordinator>,
        weight_slot: Arc<WeightSlot<A::ModelInfo>>,
        stats_sender: Sender<EpisodeStat>,
    ) -> Self {
        Self {
            id,
            agent_config,
            env_config,
            explorer,
            env_seed,
            coordinator,
            weight_slot,
            stats_sender,
            phantom: PhantomData,
        }
    }

    /// Runs the sampling loop until the global step reaches the total or the
    /// coordinator is stopped.
    ///
    /// An error of the environment or the agent ends the loop and is reported in
    /// [`ActorStat::error`].
    pub fn run(&mut self, guard_init_env: Arc<Mutex<bool>>) -> ActorStat {
        let time = Instant::now();
        let mut stat = ActorStat {
            id: self.id,
            ..Default::default()
        };

        info!("Actor {} starts sampling", self.id);
        if let Err(e) = self.run_loop(guard_init_env, &mut stat) {
            warn!("Actor {} stopped with an error: {:?}", self.id, e);
            stat.error = Some(e.to_string());
        }
        stat.duration = time.elapsed();
        info!(
            "Actor {} finished: {} steps, {} episodes",
            self.id, stat.env_steps, stat.episodes
        );

        stat
    }

    fn run_loop(&mut self, guard_init_env: Arc<Mutex<bool>>, stat: &mut ActorStat) -> Result<()> {
        let mut env = {
            let _guard = guard_init_env
                .lock()
                .map_err(|_| AdqnError::Poisoned("env init guard"))?;
            E::build(&self.env_config, self.env_seed)?
        };
        let n_actions = env.action_space().n_discrete()?;
        let mut agent = A::build(self.agent_config.clone())?;
        let mut rng = SmallRng::seed_from_u64(self.env_seed as u64);
        let mut model_version = 0;
        self.sync_model(&mut agent, &mut model_version, stat)?;

        let mut obs = env.reset()?;
        let mut episode_return = 0f32;
        let mut episode_length = 0usize;
        let mut env_reports_episodes = false;
        let mut state = ActorState::Running;

        loop {
            if self.coordinator.is_stopped() {
                break;
            }

            state = match state {
                ActorState::Running => {
                    let global_step = self.coordinator.global_step();
                    if global_step >= self.coordinator.total_timesteps() {
                        break;
                    }
                    self.sync_model(&mut agent, &mut model_version, stat)?;

                    let act = self.explorer.action(global_step, n_actions, &mut rng, || {
                        agent.action_values(&obs)
                    })?;
                    let step = env.step(act)?;
                    episode_return += step.reward;
                    episode_length += 1;

                    let next_obs = step.obs.clone();
                    let tr = Transition {
                        obs,
                        act,
                        reward: step.reward,
                        next_obs: step.obs,
                        is_done: step.is_done,
                    };
                    obs = next_obs;
                    if self.coordinator.push(tr)?.is_none() {
                        break;
                    }
                    stat.env_steps += 1;

                    // Environments reporting episodes themselves, e.g. with life-based
                    // termination, are trusted for the episode boundary.
                    env_reports_episodes |= step.episode.is_some();
                    match (step.episode, step.is_done) {
                        (Some(info), _) => ActorState::EpisodeReset(Some(info)),
                        (None, true) if env_reports_episodes => ActorState::EpisodeReset(None),
                        (None, true) => ActorState::EpisodeReset(Some(EpisodeInfo {
                            episode_return,
                            episode_length,
                        })),
                        (None, false) => ActorState::Running,
                    }
                }
                ActorState::EpisodeReset(info) => {
                    obs = env.reset()?;
                    episode_return = 0.0;
                    episode_length = 0;
                    if let Some(info) = info {
                        self.emit(info, stat);
                    }
                    ActorState::Running
                }
            };
        }

        Ok(())
    }

    fn sync_model(&self, agent: &mut A, version: &mut u64, stat: &mut ActorStat) -> Result<()> {
        if let Some(snapshot) = self.weight_slot.latest_if_newer(*version)? {
            agent.sync_model(&snapshot.model_info)?;
            *version = snapshot.version;
            stat.model_syncs += 1;
            debug!(
                "Actor {} synced model version {} ({} opt steps)",
                self.id, snapshot.version, snapshot.opt_steps
            );
        }
        Ok(())
    }

    fn emit(&self, info: EpisodeInfo, stat: &mut ActorStat) {
        let global_step = self.coordinator.global_step();
        let msg = EpisodeStat {
            actor_id: self.id,
            episode_return: info.episode_return,
            episode_length: info.episode_length,
            global_step,
            epsilon: self.explorer.epsilon(global_step),
        };
        stat.episodes += 1;
        match self.stats_sender.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                stat.dropped_stats += 1;
                if stat.dropped_stats.is_power_of_two() {
                    warn!(
                        "Actor {} dropped {} episode stats, the stats channel is full",
                        self.id, stat.dropped_stats
                    );
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
