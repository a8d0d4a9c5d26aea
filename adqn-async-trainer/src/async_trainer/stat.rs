use std::time::Duration;

/// Stats of [`AsyncTrainer`](crate::AsyncTrainer)`::train()`.
#[derive(Clone, Debug, Default)]
pub struct AsyncTrainStat {
    /// The number of samples pushed to the replay buffer per second.
    pub samples_per_sec: f32,

    /// Duration of training.
    pub duration: Duration,

    /// The number of optimization steps per second.
    pub opt_per_sec: f32,

    /// The number of optimization steps.
    pub n_updates: usize,

    /// The number of priority updates ignored because the slot had been overwritten.
    pub n_stale: usize,

    /// The number of target network synchronizations.
    pub n_target_syncs: usize,

    /// The global step when the loop ended.
    pub global_step: u64,
}

impl AsyncTrainStat {
    /// Returns a formatted string.
    pub fn fmt(&self) -> String {
        let mut s = "samples/sec, opt_steps/sec, duration, opt_steps, stale updates, target syncs, global step\n"
            .to_string();
        s += format!(
            "{}, {}, {}, {}, {}, {}, {}\n",
            self.samples_per_sec,
            self.opt_per_sec,
            self.duration.as_secs_f32(),
            self.n_updates,
            self.n_stale,
            self.n_target_syncs,
            self.global_step,
        )
        .as_str();
        s
    }
}
