/// Statistics of a finished episode, sent from an [`Actor`](crate::Actor) to the
/// [`Monitor`](crate::Monitor).
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeStat {
    /// Id of the actor.
    pub actor_id: usize,

    /// Undiscounted sum of rewards.
    pub episode_return: f32,

    /// The number of environment steps in the episode.
    pub episode_length: usize,

    /// Global step when the episode finished.
    pub global_step: u64,

    /// Exploration rate at the end of the episode.
    pub epsilon: f64,
}
