//! Prioritized replay buffer.
use super::{
    ReplayBufferConfig, SampleIx, SumTree, TransitionBatch, WeightNormalizer,
};
use crate::{error::AdqnError, Transition};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Ring buffer of transitions sampled in proportion to `priority^alpha`.
///
/// The buffer is not synchronized by itself; the training loops share it
/// behind a mutex and keep every call short.
pub struct PrioritizedReplayBuffer {
    capacity: usize,

    // Slot written by the next push.
    cursor: usize,

    size: usize,

    // Total number of pushes, used as the generation of the next transition.
    n_pushed: u64,

    obs_shape: Option<[usize; 3]>,
    slots: Vec<Option<Transition>>,
    generations: Vec<u64>,
    priorities: Vec<f32>,
    sum_tree: SumTree,
    eps: f32,
    normalize: WeightNormalizer,
    rng: StdRng,
}

impl PrioritizedReplayBuffer {
    /// Builds an empty buffer.
    pub fn build(config: &ReplayBufferConfig) -> Result<Self, AdqnError> {
        let capacity = config.capacity;
        let per_config = &config.per_config;
        if capacity == 0 {
            return Err(AdqnError::InvalidConfig(
                "capacity of the replay buffer must be positive".to_string(),
            ));
        }
        if !(per_config.alpha >= 0.0) || !(per_config.eps >= 0.0) {
            return Err(AdqnError::InvalidConfig(format!(
                "alpha and eps must be non-negative, got alpha={} eps={}",
                per_config.alpha, per_config.eps
            )));
        }

        Ok(Self {
            capacity,
            cursor: 0,
            size: 0,
            n_pushed: 0,
            obs_shape: None,
            slots: (0..capacity).map(|_| None).collect(),
            generations: vec![0; capacity],
            priorities: vec![0.0; capacity],
            sum_tree: SumTree::new(capacity, per_config.alpha),
            eps: per_config.eps,
            normalize: per_config.normalize,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of transitions pushed so far, including evicted ones.
    pub fn n_pushed(&self) -> u64 {
        self.n_pushed
    }

    /// Sum of `priority^alpha` over stored transitions.
    pub fn total_priority(&self) -> f64 {
        self.sum_tree.total()
    }

    /// The largest stored priority, or `1.0` if the buffer is empty.
    pub fn max_priority(&self) -> f32 {
        if self.size == 0 {
            1.0
        } else {
            self.sum_tree.max(self.size)
        }
    }

    /// Priority of the transition in `slot`.
    pub fn priority(&self, slot: usize) -> Option<f32> {
        if slot < self.size {
            Some(self.priorities[slot])
        } else {
            None
        }
    }

    /// The transition in `slot` with its generation.
    pub fn get(&self, slot: usize) -> Option<(&Transition, u64)> {
        self.slots
            .get(slot)
            .and_then(|tr| tr.as_ref())
            .map(|tr| (tr, self.generations[slot]))
    }

    fn check_obs_shape(&mut self, tr: &Transition) -> Result<(), AdqnError> {
        let expected = *self.obs_shape.get_or_insert(tr.obs.shape());
        for shape in [tr.obs.shape(), tr.next_obs.shape()] {
            if shape != expected {
                return Err(AdqnError::ObsShape {
                    expected: expected.to_vec(),
                    actual: shape.to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Pushes a transition with the current maximum priority.
    ///
    /// When the buffer is full, the oldest transition is overwritten together
    /// with its priority and generation.
    pub fn push(&mut self, tr: Transition) -> Result<SampleIx, AdqnError> {
        self.check_obs_shape(&tr)?;

        let priority = self.max_priority();
        let slot = self.cursor;
        let generation = self.n_pushed;

        self.slots[slot] = Some(tr);
        self.generations[slot] = generation;
        self.priorities[slot] = priority;
        self.sum_tree.set(slot, priority);

        self.n_pushed += 1;
        self.cursor = (self.cursor + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);

        Ok(SampleIx { slot, generation })
    }

    fn sample_slots(&mut self, batch_size: usize) -> Vec<usize> {
        let total = self.sum_tree.total();
        if !(total > 0.0 && total.is_finite()) {
            // All priorities are zero, fall back to uniform sampling.
            return (0..batch_size)
                .map(|_| self.rng.gen_range(0..self.size))
                .collect();
        }

        // One draw from each of `batch_size` equal segments of the total mass.
        let segment = total / batch_size as f64;
        (0..batch_size)
            .map(|i| {
                let s = segment * (i as f64 + self.rng.gen::<f64>());
                self.sum_tree.find(s).min(self.size - 1)
            })
            .collect()
    }

    fn importance_weights(&self, slots: &[usize], beta: f32) -> Vec<f32> {
        let total = self.sum_tree.total();
        if !(total > 0.0 && total.is_finite()) {
            return vec![1.0; slots.len()];
        }

        let n = self.size as f64;
        let beta = beta as f64;
        let weight = |p_alpha: f64| (n * p_alpha.max(f64::MIN_POSITIVE) / total).powf(-beta);
        let ws = slots
            .iter()
            .map(|&slot| weight(self.sum_tree.leaf(slot)))
            .collect::<Vec<_>>();
        let w_max = match self.normalize {
            WeightNormalizer::Batch => ws.iter().cloned().fold(f64::MIN_POSITIVE, f64::max),
            WeightNormalizer::All => weight(self.sum_tree.min_p_alpha(self.size) as f64),
        };

        ws.iter().map(|w| (w / w_max) as f32).collect()
    }

    /// Samples `batch_size` transitions with stratified prioritized sampling.
    ///
    /// Importance sampling weights are `(N * P(i))^-beta`, normalized as configured.
    pub fn batch(&mut self, batch_size: usize, beta: f32) -> Result<TransitionBatch, AdqnError> {
        if self.size == 0 {
            return Err(AdqnError::EmptyBuffer);
        }
        if batch_size == 0 {
            return Err(AdqnError::InvalidConfig(
                "batch size must be positive".to_string(),
            ));
        }
        let obs_shape = self.obs_shape.ok_or(AdqnError::EmptyBuffer)?;

        let slots = self.sample_slots(batch_size);
        let weight = self.importance_weights(&slots, beta);

        let mut batch = TransitionBatch::with_capacity(obs_shape, batch_size);
        for &slot in slots.iter() {
            let tr = self.slots[slot].as_ref().ok_or(AdqnError::EmptyBuffer)?;
            batch.obs.extend_from_slice(tr.obs.as_slice());
            batch.next_obs.extend_from_slice(tr.next_obs.as_slice());
            batch.act.push(tr.act as u32);
            batch.reward.push(tr.reward);
            batch.is_done.push(if tr.is_done { 1.0 } else { 0.0 });
            batch.ixs.push(SampleIx {
                slot,
                generation: self.generations[slot],
            });
        }
        batch.weight = weight;

        Ok(batch)
    }

    /// Sets priorities `|td_err| + eps` of sampled transitions.
    ///
    /// Indices whose slot has been overwritten since sampling are skipped.
    /// Returns the number of skipped indices.
    pub fn update_priority(
        &mut self,
        ixs: &[SampleIx],
        td_errs: &[f32],
    ) -> Result<usize, AdqnError> {
        if ixs.len() != td_errs.len() {
            return Err(AdqnError::LengthMismatch(ixs.len(), td_errs.len()));
        }
        if let Some(td) = td_errs.iter().find(|td| !td.is_finite()) {
            return Err(AdqnError::InvalidPriority(*td));
        }

        let mut n_stale = 0;
        for (ix, td) in ixs.iter().zip(td_errs.iter()) {
            if ix.slot >= self.size || self.generations[ix.slot] != ix.generation {
                n_stale += 1;
                continue;
            }
            let priority = td.abs() + self.eps;
            self.priorities[ix.slot] = priority;
            self.sum_tree.set(ix.slot, priority);
        }

        if n_stale > 0 {
            trace!("Skipped {} stale priority updates", n_stale);
        }
        Ok(n_stale)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{replay_buffer::PerConfig, Obs};

    const SHAPE: [usize; 3] = [1, 2, 2];

    fn transition(seq: usize) -> Transition {
        let v = (seq % 256) as u8;
        Transition {
            obs: Obs::new(SHAPE, vec![v; 4]).unwrap(),
            act: seq % 3,
            reward: seq as f32,
            next_obs: Obs::new(SHAPE, vec![v.wrapping_add(1); 4]).unwrap(),
            is_done: seq % 10 == 9,
        }
    }

    fn buffer(capacity: usize, per_config: PerConfig) -> PrioritizedReplayBuffer {
        let config = ReplayBufferConfig::default()
            .capacity(capacity)
            .seed(42)
            .per_config(per_config);
        PrioritizedReplayBuffer::build(&config).unwrap()
    }

    #[test]
    fn test_empty_buffer_batch_is_error() {
        let mut buffer = buffer(10, PerConfig::default());
        assert!(matches!(buffer.batch(4, 0.4), Err(AdqnError::EmptyBuffer)));
    }

    #[test]
    fn test_zero_capacity_is_error() {
        let config = ReplayBufferConfig::default().capacity(0);
        assert!(matches!(
            PrioritizedReplayBuffer::build(&config),
            Err(AdqnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fifo_eviction() {
        let capacity = 10;
        let k = 7;
        let mut buffer = buffer(capacity, PerConfig::default());
        for seq in 0..capacity + k {
            buffer.push(transition(seq)).unwrap();
        }

        assert_eq!(buffer.len(), capacity);
        assert_eq!(buffer.n_pushed(), (capacity + k) as u64);

        let mut retained = (0..capacity)
            .map(|slot| {
                let (tr, generation) = buffer.get(slot).unwrap();
                assert_eq!(tr.reward as u64, generation);
                generation
            })
            .collect::<Vec<_>>();
        retained.sort();
        let expected = (k as u64..(capacity + k) as u64).collect::<Vec<_>>();
        assert_eq!(retained, expected);
    }

    #[test]
    fn test_new_transition_gets_max_priority() {
        let mut buffer = buffer(8, PerConfig::default().eps(0.0));
        assert_eq!(buffer.max_priority(), 1.0);

        let ix0 = buffer.push(transition(0)).unwrap();
        let ix1 = buffer.push(transition(1)).unwrap();
        assert_eq!(buffer.priority(0), Some(1.0));

        buffer.update_priority(&[ix0, ix1], &[-3.0, 0.5]).unwrap();
        assert_eq!(buffer.max_priority(), 3.0);

        let ix2 = buffer.push(transition(2)).unwrap();
        assert_eq!(buffer.priority(ix2.slot), Some(3.0));
    }

    #[test]
    fn test_stale_priority_update_is_ignored() {
        let capacity = 4;
        let mut buffer = buffer(capacity, PerConfig::default());
        for seq in 0..capacity {
            buffer.push(transition(seq)).unwrap();
        }
        let batch = buffer.batch(4, 0.4).unwrap();
        for ix in batch.ixs.iter() {
            let (tr, generation) = buffer.get(ix.slot).unwrap();
            assert_eq!(generation, ix.generation);
            assert_eq!(tr.reward as u64, ix.generation);
        }

        // Overwrite every slot before the priorities come back.
        for seq in capacity..2 * capacity {
            buffer.push(transition(seq)).unwrap();
        }
        let before = (0..capacity)
            .map(|slot| buffer.priority(slot).unwrap())
            .collect::<Vec<_>>();
        let n_stale = buffer
            .update_priority(&batch.ixs, &vec![100.0; batch.len()])
            .unwrap();
        let after = (0..capacity)
            .map(|slot| buffer.priority(slot).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(n_stale, batch.len());
        assert_eq!(before, after);
        assert_eq!(buffer.max_priority(), 1.0);
    }

    #[test]
    fn test_update_priority_rejects_invalid_input() {
        let mut buffer = buffer(4, PerConfig::default());
        let ix = buffer.push(transition(0)).unwrap();

        assert!(matches!(
            buffer.update_priority(&[ix], &[f32::NAN]),
            Err(AdqnError::InvalidPriority(_))
        ));
        assert!(matches!(
            buffer.update_priority(&[ix], &[1.0, 2.0]),
            Err(AdqnError::LengthMismatch(1, 2))
        ));
        assert_eq!(buffer.priority(0), Some(1.0));
    }

    #[test]
    fn test_obs_shape_mismatch_is_rejected() {
        let mut buffer = buffer(4, PerConfig::default());
        buffer.push(transition(0)).unwrap();

        let mut tr = transition(1);
        tr.next_obs = Obs::zeros([2, 2, 2]);
        assert!(matches!(buffer.push(tr), Err(AdqnError::ObsShape { .. })));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_batch_layout() {
        let mut buffer = buffer(4, PerConfig::default());
        buffer.push(transition(9)).unwrap();
        let batch = buffer.batch(3, 0.4).unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.obs_batch_shape(), [3, 1, 2, 2]);
        assert_eq!(batch.obs, vec![9; 12]);
        assert_eq!(batch.next_obs, vec![10; 12]);
        assert_eq!(batch.act, vec![0; 3]);
        assert_eq!(batch.is_done, vec![1.0; 3]);
        assert_eq!(batch.weight, vec![1.0; 3]);
    }

    #[test]
    fn test_importance_weights() {
        let alpha = 0.6f32;
        let mut buffer = buffer(
            2,
            PerConfig::default()
                .alpha(alpha)
                .eps(0.0)
                .normalize(WeightNormalizer::All),
        );
        let ix0 = buffer.push(transition(0)).unwrap();
        let ix1 = buffer.push(transition(1)).unwrap();
        buffer.update_priority(&[ix0, ix1], &[1.0, 10.0]).unwrap();

        // With beta = 1, weights are inversely proportional to probabilities.
        let w_outlier = 1.0 / 10f32.powf(alpha);
        for _ in 0..100 {
            let batch = buffer.batch(2, 1.0).unwrap();
            for (ix, w) in batch.ixs.iter().zip(batch.weight.iter()) {
                let expected = if ix.slot == 1 { w_outlier } else { 1.0 };
                assert!((w - expected).abs() < 1e-5, "{} vs {}", w, expected);
            }
        }
    }

    #[test]
    fn test_sampling_frequency_follows_priority() {
        let capacity = 100;
        let batch_size = 8;
        let n_batches = 10_000;
        let alpha = 0.6f32;
        let mut buffer = buffer(capacity, PerConfig::default().alpha(alpha));

        let ixs = (0..capacity)
            .map(|seq| buffer.push(transition(seq)).unwrap())
            .collect::<Vec<_>>();
        let mut td_errs = vec![1.0f32; capacity];
        td_errs[capacity - 1] = 10.0;
        buffer.update_priority(&ixs, &td_errs).unwrap();

        let mut n_outlier = 0usize;
        for _ in 0..n_batches {
            let batch = buffer.batch(batch_size, 0.4).unwrap();
            n_outlier += batch.ixs.iter().filter(|ix| ix.slot == capacity - 1).count();
        }

        let p = 10f64.powf(alpha as f64) / (99.0 + 10f64.powf(alpha as f64));
        let freq = n_outlier as f64 / (n_batches * batch_size) as f64;
        let rel_err = (freq - p).abs() / p;
        println!("freq = {}, expected = {}, rel_err = {}", freq, p, rel_err);
        assert!(rel_err < 0.05);
    }
}
