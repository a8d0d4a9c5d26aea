use std::time::Duration;

/// Stats of sampling process in each [Actor](crate::Actor).
#[derive(Clone, Debug, Default)]
pub struct ActorStat {
    /// Id of the actor.
    pub id: usize,

    /// The number of transitions pushed to the replay buffer.
    pub env_steps: usize,

    /// The number of finished episodes.
    pub episodes: usize,

    /// The number of episode stats dropped because the stats channel was full.
    pub dropped_stats: usize,

    /// The number of model synchronizations with the learner.
    pub model_syncs: usize,

    /// Duration of sampling loop in [Actor](crate::Actor).
    pub duration: Duration,

    /// Error that terminated the actor, if any.
    pub error: Option<String>,
}

/// Returns a formatted string of the set of [ActorStat] for reporting.
pub fn actor_stats_fmt(stats: &[ActorStat]) -> String {
    let mut s = "actor id, samples, episodes, duration [sec], samples per sec, error\n".to_string();
    for stat in stats.iter() {
        let n = stat.env_steps;
        let d = stat.duration.as_secs_f32();
        let p = (n as f32) / d.max(f32::EPSILON);
        let e = stat.error.as_deref().unwrap_or("-");
        s += format!("{}, {}, {}, {}, {}, {}\n", stat.id, n, stat.episodes, d, p, e).as_str();
    }
    s
}
