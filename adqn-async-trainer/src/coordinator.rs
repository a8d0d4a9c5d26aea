//! State shared by actors and the learner.
use adqn_core::{
    replay_buffer::{PrioritizedReplayBuffer, SampleIx, TransitionBatch},
    AdqnError, Transition,
};
use anyhow::Result;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard,
};

/// Owns the replay buffer, the global step and the termination state.
///
/// The global step counts transitions pushed by all actors. It is incremented
/// while the buffer lock is held, so it always equals the number of pushes,
/// and it can be read without the lock.
pub struct Coordinator {
    buffer: Mutex<PrioritizedReplayBuffer>,
    global_step: AtomicU64,
    total_timesteps: u64,
    active_actors: AtomicUsize,
    stop: AtomicBool,
}

impl Coordinator {
    /// Creates a coordinator. Pushes are refused once `total_timesteps` is reached.
    pub fn new(buffer: PrioritizedReplayBuffer, total_timesteps: u64) -> Self {
        Self {
            buffer: Mutex::new(buffer),
            global_step: AtomicU64::new(0),
            total_timesteps,
            active_actors: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        }
    }

    fn lock_buffer(&self) -> Result<MutexGuard<PrioritizedReplayBuffer>, AdqnError> {
        self.buffer
            .lock()
            .map_err(|_| AdqnError::Poisoned("replay buffer"))
    }

    /// The number of transitions pushed so far.
    pub fn global_step(&self) -> u64 {
        self.global_step.load(Ordering::Acquire)
    }

    /// The number of transitions to be collected in the whole training.
    pub fn total_timesteps(&self) -> u64 {
        self.total_timesteps
    }

    /// Pushes a transition and increments the global step.
    ///
    /// Returns the new global step, or `None` without pushing when
    /// `total_timesteps` has already been reached.
    pub fn push(&self, tr: Transition) -> Result<Option<u64>> {
        let mut buffer = self.lock_buffer()?;
        if self.global_step.load(Ordering::Acquire) >= self.total_timesteps {
            return Ok(None);
        }
        buffer.push(tr)?;
        Ok(Some(self.global_step.fetch_add(1, Ordering::AcqRel) + 1))
    }

    /// Samples a batch. See [`PrioritizedReplayBuffer::batch`].
    pub fn sample(&self, batch_size: usize, beta: f32) -> Result<TransitionBatch> {
        Ok(self.lock_buffer()?.batch(batch_size, beta)?)
    }

    /// Updates priorities of sampled transitions. Returns the number of stale indices.
    pub fn update_priority(&self, ixs: &[SampleIx], td_errs: &[f32]) -> Result<usize> {
        Ok(self.lock_buffer()?.update_priority(ixs, td_errs)?)
    }

    /// The number of transitions in the replay buffer.
    pub fn buffer_len(&self) -> Result<usize> {
        Ok(self.lock_buffer()?.len())
    }

    /// Asks all loops to exit.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Returns `true` if [`Coordinator::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Returns `true` if loops should exit.
    pub fn is_finished(&self) -> bool {
        self.is_stopped() || self.global_step() >= self.total_timesteps
    }

    /// Counts an actor as running until the returned value is dropped.
    pub fn register_actor(self: &Arc<Self>) -> ActorRegistration {
        self.active_actors.fetch_add(1, Ordering::AcqRel);
        ActorRegistration {
            coordinator: self.clone(),
        }
    }

    /// The number of running actors.
    pub fn active_actors(&self) -> usize {
        self.active_actors.load(Ordering::Acquire)
    }
}

/// Keeps an actor counted in [`Coordinator::active_actors`].
pub struct ActorRegistration {
    coordinator: Arc<Coordinator>,
}

impl Drop for ActorRegistration {
    fn drop(&mut self) {
        self.coordinator
            .active_actors
            .fetch_sub(1, Ordering::AcqRel);
    }
}
