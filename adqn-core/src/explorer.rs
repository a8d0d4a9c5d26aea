//! Epsilon-greedy exploration driven by the global step.
use crate::schedule::LinearSchedule;
use anyhow::Result;
use rand::Rng;

/// Index of the largest value. The first one wins on ties.
pub fn argmax(xs: &[f32]) -> usize {
    xs.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(ix_max, v_max), (ix, &v)| {
            if v > v_max {
                (ix, v)
            } else {
                (ix_max, v_max)
            }
        })
        .0
}

/// Epsilon-greedy explorer.
///
/// Epsilon decays linearly from `start_e` to `end_e` over the first
/// `exploration_fraction * total_timesteps` environment steps.
#[derive(Clone, Debug)]
pub struct EpsilonGreedy {
    schedule: LinearSchedule,
}

impl EpsilonGreedy {
    /// Constructs the explorer.
    pub fn new(start_e: f64, end_e: f64, exploration_fraction: f64, total_timesteps: u64) -> Self {
        Self {
            schedule: LinearSchedule::new(
                start_e,
                end_e,
                exploration_fraction * total_timesteps as f64,
            ),
        }
    }

    /// Epsilon at the given global step.
    pub fn epsilon(&self, global_step: u64) -> f64 {
        self.schedule.value(global_step)
    }

    /// Takes a random action with probability epsilon, the greedy one otherwise.
    ///
    /// `action_values` is evaluated only when the greedy action is taken.
    pub fn action<R, F>(
        &self,
        global_step: u64,
        n_actions: usize,
        rng: &mut R,
        action_values: F,
    ) -> Result<usize>
    where
        R: Rng,
        F: FnOnce() -> Result<Vec<f32>>,
    {
        if rng.gen::<f64>() < self.epsilon(global_step) {
            Ok(rng.gen_range(0..n_actions))
        } else {
            Ok(argmax(&action_values()?))
        }
    }
}
