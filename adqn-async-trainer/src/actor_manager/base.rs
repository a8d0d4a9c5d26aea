use crate::{
    Actor, ActorManagerConfig, ActorRegistration, ActorStat, Coordinator, EpisodeStat, SyncModel,
    WeightSlot,
};
use adqn_core::{AdqnError, Agent, Env};
use anyhow::Result;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
    thread::JoinHandle,
};

/// Manages [`Actor`]s.
///
/// One thread is spawned per element of `agent_configs`. All actors push into the
/// replay buffer of the shared [`Coordinator`] and read weights from the shared
/// [`WeightSlot`].
pub struct ActorManager<A, E>
where
    A: Agent + SyncModel,
    E: Env,
{
    /// Configurations of [`Agent`]s.
    agent_configs: Vec<A::Config>,

    /// Configuration of [`Env`].
    env_config: E::Config,

    config: ActorManagerConfig,
    total_timesteps: u64,
    coordinator: Arc<Coordinator>,
    weight_slot: Arc<WeightSlot<A::ModelInfo>>,

    /// Taken when the actors are spawned, so the channel disconnects once they all exit.
    stats_sender: Option<Sender<EpisodeStat>>,

    /// Live-actor registrations handed to the threads when they are spawned.
    registrations: Vec<ActorRegistration>,

    /// Thread handles.
    threads: Vec<JoinHandle<ActorStat>>,

    phantom: PhantomData<fn() -> E>,
}

impl<A, E> ActorManager<A, E>
where
    A: Agent + SyncModel + 'static,
    E: Env + 'static,
    A::Config: Send + 'static,
    E::Config: Send + 'static,
{
    /// Builds a [`ActorManager`].
    pub fn build(
        config: &ActorManagerConfig,
        agent_configs: &[A::Config],
        env_config: &E::Config,
        total_timesteps: u64,
        coordinator: Arc<Coordinator>,
        weight_slot: Arc<WeightSlot<A::ModelInfo>>,
        stats_sender: Sender<EpisodeStat>,
    ) -> Self {
        Self {
            agent_configs: agent_configs.to_vec(),
            env_config: env_config.clone(),
            config: config.clone(),
            total_timesteps,
            coordinator,
            weight_slot,
            stats_sender: Some(stats_sender),
            registrations: vec![],
            threads: vec![],
            phantom: PhantomData,
        }
    }

    /// The number of actors.
    pub fn n_actors(&self) -> usize {
        self.agent_configs.len()
    }

    /// Registers all actors as live in the coordinator without starting them.
    ///
    /// A learner started after this call does not observe zero live actors while
    /// the actor threads are being spawned. Calling it twice has no effect.
    pub fn register(&mut self) {
        if self.registrations.is_empty() && self.threads.is_empty() {
            self.registrations = (0..self.n_actors())
                .map(|_| self.coordinator.register_actor())
                .collect();
        }
    }

    /// Spawns actor threads, registering them first if [`ActorManager::register`]
    /// has not been called.
    pub fn run(&mut self, guard_init_env: Arc<Mutex<bool>>) -> Result<()> {
        let stats_sender = self
            .stats_sender
            .take()
            .ok_or_else(|| AdqnError::InvalidConfig("actors have already been started".into()))?;
        self.register();
        let registrations = std::mem::take(&mut self.registrations);

        for (id, (agent_config, registration)) in self
            .agent_configs
            .iter()
            .cloned()
            .zip(registrations)
            .enumerate()
        {
            let mut actor = Actor::<A, E>::build(
                id,
                agent_config,
                self.env_config.clone(),
                self.config.exploration.build(self.total_timesteps),
                self.config.seed + id as i64,
                self.coordinator.clone(),
                self.weight_slot.clone(),
                stats_sender.clone(),
            );
            let guard = guard_init_env.clone();
            let handle = std::thread::Builder::new()
                .name(format!("actor-{}", id))
                .spawn(move || {
                    let _registration = registration;
                    actor.run(guard)
                })?;
            self.threads.push(handle);
        }
        info!("Started {} actors", self.n_actors());

        Ok(())
    }

    /// Waits until all actors finish.
    ///
    /// An actor thread that panicked is reported as an [`ActorStat`] with an error.
    pub fn join(self) -> Vec<ActorStat> {
        self.threads
            .into_iter()
            .enumerate()
            .map(|(id, h)| {
                h.join().unwrap_or_else(|_| {
                    warn!("Actor {} panicked", id);
                    ActorStat {
                        id,
                        error: Some("panicked".into()),
                        ..Default::default()
                    }
                })
            })
            .collect()
    }

    /// Stops actor threads.
    pub fn stop(&self) {
        self.coordinator.stop();
    }

    /// Stops and joins actors.
    pub fn stop_and_join(self) -> Vec<ActorStat> {
        self.stop();
        self.join()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{TestAgent, TestAgentConfig, TestEnv, TestEnvConfig};
    use adqn_core::replay_buffer::{PrioritizedReplayBuffer, ReplayBufferConfig};
    use crossbeam_channel::bounded;
    use test_log::test;

    #[test]
    fn test_actors_are_live_before_threads_start() -> Result<()> {
        let buffer = PrioritizedReplayBuffer::build(&ReplayBufferConfig::default())?;
        let coordinator = Arc::new(Coordinator::new(buffer, 100));
        let (stats_s, _stats_r) = bounded(100);
        let mut actors = ActorManager::<TestAgent, TestEnv>::build(
            &ActorManagerConfig::default(),
            &vec![TestAgentConfig::default(); 3],
            &TestEnvConfig::default(),
            100,
            coordinator.clone(),
            Arc::new(WeightSlot::new()),
            stats_s,
        );

        actors.register();
        actors.register();
        assert_eq!(coordinator.active_actors(), 3);

        actors.run(Arc::new(Mutex::new(true)))?;
        let stats = actors.join();
        assert_eq!(stats.iter().map(|s| s.env_steps).sum::<usize>(), 100);
        assert_eq!(coordinator.active_actors(), 0);
        Ok(())
    }
}
