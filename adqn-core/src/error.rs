//! Errors in the library.
use thiserror::Error;

/// Errors raised by the core types and the training loops.
#[derive(Error, Debug)]
pub enum AdqnError {
    /// The key was not found in a record.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// The record value has a type different from the requested one.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// Sampling was requested from a buffer holding no transitions.
    #[error("Replay buffer is empty")]
    EmptyBuffer,

    /// A TD error or priority was not a finite number.
    #[error("Invalid priority: {0}")]
    InvalidPriority(f32),

    /// Observation shape does not match the data or the buffer.
    #[error("Observation shape error: expected {expected:?}, got {actual:?}")]
    ObsShape {
        /// Expected shape.
        expected: Vec<usize>,
        /// Given shape.
        actual: Vec<usize>,
    },

    /// Lengths of arguments that must agree differ.
    #[error("Length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The environment id is not registered.
    #[error("Unknown environment id: {0}")]
    UnknownEnv(String),

    /// The environment does not have a discrete action space.
    #[error("Only discrete action spaces are supported, got {0}")]
    NonDiscreteActionSpace(String),

    /// Failure in an environment step or reset.
    #[error("Environment error: {0}")]
    Env(String),

    /// A lock was poisoned by a panicking thread.
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
}
