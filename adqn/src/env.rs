//! Environments selectable by id.
mod catch;
use adqn_core::AdqnError;
pub use catch::{CatchConfig, CatchEnv};
use std::str::FromStr;

/// Registered environment ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvId {
    /// `Catch-v0`: 84x84 frames stacked 4 times, trained with a CNN.
    Catch,

    /// `CatchSmall-v0`: 12x12 single frames, trained with an MLP.
    CatchSmall,
}

impl EnvId {
    /// Configuration of the environment.
    pub fn config(&self) -> CatchConfig {
        match self {
            Self::Catch => CatchConfig::default(),
            Self::CatchSmall => CatchConfig::small(),
        }
    }
}

impl FromStr for EnvId {
    type Err = AdqnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Catch-v0" => Ok(Self::Catch),
            "CatchSmall-v0" => Ok(Self::CatchSmall),
            _ => Err(AdqnError::UnknownEnv(s.to_string())),
        }
    }
}
