use super::Obs;

/// One environment step `(o_t, a_t, r_t, o_t+1, done)`.
///
/// Moved into the replay buffer on insert and never shared with the actor afterwards.
#[derive(Clone, Debug)]
pub struct Transition {
    /// Observation before the action.
    pub obs: Obs,

    /// Action index.
    pub act: usize,

    /// Reward.
    pub reward: f32,

    /// Observation after the action.
    pub next_obs: Obs,

    /// `true` if the episode ended with this transition.
    pub is_done: bool,
}
