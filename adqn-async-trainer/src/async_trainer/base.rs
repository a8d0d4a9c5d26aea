use crate::{AsyncTrainStat, AsyncTrainerConfig, Coordinator, SyncModel, WeightSlot};
use adqn_core::{
    record::{Record, RecordValue::Scalar},
    schedule::LinearSchedule,
    Agent,
};
use anyhow::Result;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

/// Manages the learner loop of asynchronous training in a single machine.
///
/// It will be used with [`ActorManager`](crate::ActorManager). Updates are paced
/// by the global step: the first one happens when the global step exceeds
/// `learning_starts`, and each one after that waits for `train_frequency` more
/// environment steps.
pub struct AsyncTrainer<A>
where
    A: Agent + SyncModel,
{
    config: AsyncTrainerConfig,

    coordinator: Arc<Coordinator>,

    weight_slot: Arc<WeightSlot<A::ModelInfo>>,

    /// Records are sent to the monitor. Dropped once the monitor has gone away.
    record_sender: Option<Sender<Record>>,

    phantom: PhantomData<fn() -> A>,
}

impl<A> AsyncTrainer<A>
where
    A: Agent + SyncModel,
{
    /// Creates [`AsyncTrainer`].
    pub fn build(
        config: &AsyncTrainerConfig,
        coordinator: Arc<Coordinator>,
        weight_slot: Arc<WeightSlot<A::ModelInfo>>,
        record_sender: Sender<Record>,
    ) -> Self {
        Self {
            config: config.clone(),
            coordinator,
            weight_slot,
            record_sender: Some(record_sender),
            phantom: PhantomData,
        }
    }

    /// Publishes the current online weights to actors.
    pub fn publish(&self, agent: &A) -> Result<u64> {
        let (opt_steps, model_info) = agent.model_info()?;
        let version = self.weight_slot.publish(opt_steps, model_info)?;
        debug!("Published model version {} ({} opt steps)", version, opt_steps);
        Ok(version)
    }

    fn send_record(&mut self, record: Record) {
        if let Some(sender) = &self.record_sender {
            if sender.send(record).is_err() {
                debug!("The monitor has gone away; learner records are no longer sent");
                self.record_sender = None;
            }
        }
    }

    fn save_model(&self, agent: &A, name: &str) {
        if let Some(model_dir) = &self.config.model_dir {
            let path: PathBuf = Path::new(model_dir).join(name);
            let result = std::fs::create_dir_all(&path)
                .map_err(anyhow::Error::from)
                .and_then(|_| agent.save_params(&path));
            match result {
                Ok(()) => info!("Saved the model in {:?}", &path),
                Err(e) => warn!("Failed to save the model in {:?}: {}", &path, e),
            }
        }
    }

    /// Runs the learner loop until the global step reaches the total, all actors
    /// have exited or the coordinator is stopped.
    ///
    /// On error the coordinator is stopped, so actors exit too.
    pub fn train(&mut self, agent: &mut A) -> Result<AsyncTrainStat> {
        let result = self.train_loop(agent);
        if let Err(e) = &result {
            warn!("Learner stopped with an error: {:?}", e);
            self.coordinator.stop();
        }
        result
    }

    fn train_loop(&mut self, agent: &mut A) -> Result<AsyncTrainStat> {
        let time = Instant::now();
        let total_timesteps = self.coordinator.total_timesteps();
        let beta = LinearSchedule::new(self.config.pr_beta0, 1.0, total_timesteps as f64);
        let mut next_update_at = self.config.learning_starts + 1;
        let mut n_updates = 0;
        let mut n_stale = 0;
        let mut n_target_syncs = 0;
        let mut n_updates_ = 0;
        let mut record_time = Instant::now();

        info!("Starts training loop");
        loop {
            if self.coordinator.is_stopped() {
                info!("Learner received the stop signal");
                break;
            }
            if self.coordinator.active_actors() == 0 {
                info!("All actors have exited");
                break;
            }
            let global_step = self.coordinator.global_step();
            if global_step >= total_timesteps {
                break;
            }
            if global_step < next_update_at {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }
            next_update_at += self.config.train_frequency;

            let beta_t = beta.value(global_step) as f32;
            let batch = self.coordinator.sample(self.config.batch_size, beta_t)?;
            let outcome = agent.opt(&batch)?;
            let stale = self
                .coordinator
                .update_priority(&batch.ixs, &outcome.td_errs)?;
            if stale > 0 {
                debug!("Ignored {} stale priority updates", stale);
            }
            n_updates += 1;
            n_updates_ += 1;
            n_stale += stale;

            if n_updates % self.config.publish_interval == 0 {
                self.publish(agent)?;
            }
            if n_updates % self.config.target_network_frequency == 0 {
                agent.sync_target()?;
                n_target_syncs += 1;
            }
            if n_updates % self.config.record_interval == 0 {
                let ups = n_updates_ as f32 / record_time.elapsed().as_secs_f32().max(f32::EPSILON);
                let mut record = Record::from_slice(&[
                    ("global_step", Scalar(global_step as _)),
                    ("opt_steps", Scalar(n_updates as _)),
                    ("charts/beta", Scalar(beta_t)),
                    ("charts/updates_per_sec", Scalar(ups)),
                    ("charts/stale_priority_updates", Scalar(n_stale as _)),
                ]);
                record.merge_inplace(outcome.record);
                self.send_record(record);
                info!(
                    "global step = {}, opt steps = {}, updates/sec = {}",
                    global_step, n_updates, ups
                );
                n_updates_ = 0;
                record_time = Instant::now();
            }
            if n_updates % self.config.save_interval == 0 {
                self.save_model(agent, &n_updates.to_string());
            }
        }
        self.save_model(agent, "final");

        let duration = time.elapsed();
        let global_step = self.coordinator.global_step();
        let secs = duration.as_secs_f32().max(f32::EPSILON);
        Ok(AsyncTrainStat {
            samples_per_sec: global_step as f32 / secs,
            opt_per_sec: n_updates as f32 / secs,
            duration,
            n_updates,
            n_stale,
            n_target_syncs,
            global_step,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{prefill, TestAgent, TestAgentConfig};
    use adqn_core::replay_buffer::{PrioritizedReplayBuffer, ReplayBufferConfig};
    use crossbeam_channel::unbounded;
    use std::thread;
    use tempdir::TempDir;
    use test_log::test;

    #[test]
    fn test_learner_intervals() -> Result<()> {
        let dir = TempDir::new("async_trainer")?;
        let model_dir = dir.path().to_string_lossy().to_string();
        let config = AsyncTrainerConfig::default()
            .total_timesteps(1000)
            .learning_starts(100)
            .train_frequency(4)
            .batch_size(8)
            .target_network_frequency(10)
            .publish_interval(10)
            .record_interval(25)
            .save_interval(50)
            .model_dir(model_dir);
        let buffer = PrioritizedReplayBuffer::build(&ReplayBufferConfig::default().capacity(1000))?;
        let coordinator = Arc::new(Coordinator::new(buffer, config.total_timesteps));
        let weight_slot = Arc::new(WeightSlot::new());
        let (record_s, record_r) = unbounded();

        // Steps 1..=500 gate updates at 101, 105, ..., 497.
        prefill(&coordinator, 500)?;
        let registration = coordinator.register_actor();

        let watcher = {
            let coordinator = coordinator.clone();
            let weight_slot = weight_slot.clone();
            thread::spawn(move || {
                while weight_slot.version() < 10 {
                    thread::sleep(Duration::from_millis(1));
                }
                // Give the learner a chance to run past the last gated update.
                thread::sleep(Duration::from_millis(20));
                coordinator.stop();
            })
        };

        let mut agent = TestAgent::build(TestAgentConfig::default())?;
        let mut trainer =
            AsyncTrainer::<TestAgent>::build(&config, coordinator.clone(), weight_slot.clone(), record_s);
        let stat = trainer.train(&mut agent)?;
        watcher.join().unwrap();
        drop(registration);

        assert_eq!(stat.n_updates, 100);
        assert_eq!(stat.n_target_syncs, 10);
        assert_eq!(agent.n_opts(), 100);
        assert_eq!(agent.target_syncs, (1..=10).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(weight_slot.version(), 10);
        assert_eq!(weight_slot.latest()?.unwrap().opt_steps, 100);

        let records = record_r.try_iter().collect::<Vec<_>>();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].get_scalar("opt_steps")?, 25.0);
        assert!(records[0].get_scalar("charts/beta")? >= 0.4);
        assert!(records[0].get_scalar("losses/td_loss").is_ok());

        for name in ["50", "100", "final"].iter() {
            assert!(dir.path().join(name).join("params.yaml").exists());
        }
        Ok(())
    }

    #[test]
    fn test_learner_exits_without_actors() -> Result<()> {
        let config = AsyncTrainerConfig::default().total_timesteps(1000);
        let buffer = PrioritizedReplayBuffer::build(&ReplayBufferConfig::default())?;
        let coordinator = Arc::new(Coordinator::new(buffer, config.total_timesteps));
        let (record_s, _record_r) = unbounded();
        let mut agent = TestAgent::build(TestAgentConfig::default())?;
        let mut trainer =
            AsyncTrainer::<TestAgent>::build(&config, coordinator, Arc::new(WeightSlot::new()), record_s);

        let stat = trainer.train(&mut agent)?;
        assert_eq!(stat.n_updates, 0);
        Ok(())
    }

    #[test]
    fn test_learner_continues_after_monitor_is_gone() -> Result<()> {
        let config = AsyncTrainerConfig::default()
            .total_timesteps(1000)
            .learning_starts(10)
            .train_frequency(1)
            .record_interval(1);
        let buffer = PrioritizedReplayBuffer::build(&ReplayBufferConfig::default())?;
        let coordinator = Arc::new(Coordinator::new(buffer, config.total_timesteps));
        let weight_slot = Arc::new(WeightSlot::new());
        prefill(&coordinator, 20)?;
        let _registration = coordinator.register_actor();
        let (record_s, record_r) = unbounded();
        drop(record_r);

        // Steps 1..=20 gate updates at 11, 12, ..., 20.
        let watcher = {
            let coordinator = coordinator.clone();
            let weight_slot = weight_slot.clone();
            thread::spawn(move || {
                while weight_slot.version() < 10 {
                    thread::sleep(Duration::from_millis(1));
                }
                coordinator.stop();
            })
        };

        let mut agent = TestAgent::build(TestAgentConfig::default())?;
        let mut trainer =
            AsyncTrainer::<TestAgent>::build(&config, coordinator, weight_slot, record_s);
        let stat = trainer.train(&mut agent)?;
        watcher.join().unwrap();

        assert_eq!(stat.n_updates, 10);
        assert!(trainer.record_sender.is_none());
        Ok(())
    }

    #[test]
    fn test_learner_error_stops_coordinator() -> Result<()> {
        let config = AsyncTrainerConfig::default()
            .total_timesteps(1000)
            .learning_starts(10)
            .train_frequency(1);
        let buffer = PrioritizedReplayBuffer::build(&ReplayBufferConfig::default())?;
        let coordinator = Arc::new(Coordinator::new(buffer, config.total_timesteps));
        prefill(&coordinator, 20)?;
        let _registration = coordinator.register_actor();
        let (record_s, _record_r) = unbounded();
        let mut agent = TestAgent::build(TestAgentConfig {
            fail_at: Some(3),
            ..Default::default()
        })?;
        let mut trainer = AsyncTrainer::<TestAgent>::build(
            &config,
            coordinator.clone(),
            Arc::new(WeightSlot::new()),
            record_s,
        );

        assert!(trainer.train(&mut agent).is_err());
        assert!(coordinator.is_stopped());
        Ok(())
    }
}
