//! Agent.
use super::Obs;
use crate::{record::Record, replay_buffer::TransitionBatch};
use anyhow::Result;
use std::path::Path;

/// Output of a single optimization step.
#[derive(Debug)]
pub struct OptOutcome {
    /// TD errors `target - Q(s, a)` of each sample in the batch, in batch order.
    pub td_errs: Vec<f32>,

    /// Values to be recorded, such as the loss.
    pub record: Record,
}

/// A trainable action-value function with its target network.
///
/// The learner owns one instance and trains it with [`Agent::opt`].
/// Each actor owns another instance used only for [`Agent::action_values`].
pub trait Agent {
    /// Configuration of the agent.
    type Config: Clone;

    /// Builds the agent.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Action values of a single observation, computed without gradient tracking.
    fn action_values(&self, obs: &Obs) -> Result<Vec<f32>>;

    /// Performs one gradient step on the online network with a sampled batch.
    fn opt(&mut self, batch: &TransitionBatch) -> Result<OptOutcome>;

    /// Copies the online network into the target network.
    fn sync_target(&mut self) -> Result<()>;

    /// The number of optimization steps performed so far.
    fn n_opts(&self) -> usize;

    /// Saves the parameters of the networks in the directory `path`.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads the parameters of the networks from the directory `path`.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
