use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    pub(super) n_stack: i64,
    pub(super) out_dim: i64,
}

impl CnnConfig {
    /// Constructs [`CnnConfig`] for `84x84` frames stacked `n_stack` times.
    pub fn new(n_stack: i64, out_dim: i64) -> Self {
        Self { n_stack, out_dim }
    }
}

impl OutDim for CnnConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }
}
