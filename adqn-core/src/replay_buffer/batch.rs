//! Batch of sampled transitions.

/// Index of a sampled transition.
///
/// `generation` is the sequence number of the insertion that wrote the slot.
/// A priority update is applied only while the slot still holds that insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleIx {
    /// Slot in the ring buffer.
    pub slot: usize,

    /// Sequence number of the transition in the slot.
    pub generation: u64,
}

/// Transitions sampled from the replay buffer, laid out as flat arrays.
///
/// Observations of sample `i` occupy `obs[i * n .. (i + 1) * n]` with
/// `n = obs_shape.iter().product()`.
#[derive(Clone, Debug)]
pub struct TransitionBatch {
    /// Shape `[C, H, W]` of a single observation.
    pub obs_shape: [usize; 3],

    /// Observations.
    pub obs: Vec<u8>,

    /// Actions.
    pub act: Vec<u32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<u8>,

    /// `1.0` where the episode ended with the transition, `0.0` otherwise.
    pub is_done: Vec<f32>,

    /// Sampled indices.
    pub ixs: Vec<SampleIx>,

    /// Importance sampling weights.
    pub weight: Vec<f32>,
}

impl TransitionBatch {
    pub(super) fn with_capacity(obs_shape: [usize; 3], n: usize) -> Self {
        let obs_len = obs_shape.iter().product::<usize>() * n;
        Self {
            obs_shape,
            obs: Vec::with_capacity(obs_len),
            act: Vec::with_capacity(n),
            reward: Vec::with_capacity(n),
            next_obs: Vec::with_capacity(obs_len),
            is_done: Vec::with_capacity(n),
            ixs: Vec::with_capacity(n),
            weight: Vec::with_capacity(n),
        }
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }

    /// Shape `[B, C, H, W]` of the observation arrays.
    pub fn obs_batch_shape(&self) -> [usize; 4] {
        let [c, h, w] = self.obs_shape;
        [self.len(), c, h, w]
    }
}
