//! Single-slot mailbox of model weights published by the learner.
use adqn_core::AdqnError;
use anyhow::Result;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

/// Immutable snapshot of the learner's model.
#[derive(Debug)]
pub struct ModelSnapshot<M> {
    /// Version of the snapshot, starting from 1 and incremented per publication.
    pub version: u64,

    /// The number of optimization steps of the model.
    pub opt_steps: usize,

    /// Model parameters.
    pub model_info: M,
}

/// Holds the latest [`ModelSnapshot`].
///
/// A publication replaces the whole snapshot, so a reader gets either the
/// previous or the new one and never a mixture. Readers keep their snapshot
/// alive through the returned [`Arc`] while the learner publishes newer ones.
pub struct WeightSlot<M> {
    latest: RwLock<Option<Arc<ModelSnapshot<M>>>>,
    version: AtomicU64,
}

impl<M> Default for WeightSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> WeightSlot<M> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// Version of the latest snapshot, `0` if nothing has been published.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Publishes a snapshot, replacing the previous one. Returns its version.
    pub fn publish(&self, opt_steps: usize, model_info: M) -> Result<u64> {
        let mut latest = self
            .latest
            .write()
            .map_err(|_| AdqnError::Poisoned("weight slot"))?;
        let version = self.version.load(Ordering::Relaxed) + 1;
        *latest = Some(Arc::new(ModelSnapshot {
            version,
            opt_steps,
            model_info,
        }));
        self.version.store(version, Ordering::Release);
        Ok(version)
    }

    /// The latest snapshot.
    pub fn latest(&self) -> Result<Option<Arc<ModelSnapshot<M>>>> {
        let latest = self
            .latest
            .read()
            .map_err(|_| AdqnError::Poisoned("weight slot"))?;
        Ok(latest.clone())
    }

    /// The latest snapshot if it is newer than `version`.
    ///
    /// Checks the version without taking the lock first.
    pub fn latest_if_newer(&self, version: u64) -> Result<Option<Arc<ModelSnapshot<M>>>> {
        if self.version() <= version {
            return Ok(None);
        }
        Ok(self.latest()?.filter(|snapshot| snapshot.version > version))
    }
}
