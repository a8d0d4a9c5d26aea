//! DQN agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! [`dqn::Dqn`] implements [`adqn_core::Agent`] for the learner and the actors, and
//! [`adqn_async_trainer::SyncModel`] for moving weights between them as
//! [`util::NamedTensors`].
pub mod cnn;
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
