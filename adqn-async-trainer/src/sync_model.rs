use anyhow::Result;

/// Synchronizes the model of the agent in asynchronous training.
pub trait SyncModel {
    /// Information of the model, such as a copy of its parameters.
    type ModelInfo: Clone + Send + Sync + 'static;

    /// Gets `ModelInfo`.
    ///
    /// The first element of the return value is the number of optimization steps.
    fn model_info(&self) -> Result<(usize, Self::ModelInfo)>;

    /// Loads the given model information into the model.
    fn sync_model(&mut self, model_info: &Self::ModelInfo) -> Result<()>;
}
