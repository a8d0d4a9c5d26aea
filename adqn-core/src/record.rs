//! Records of training metrics and the sinks they are written to.
//!
//! ```rust
//! use adqn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("global_step", 1000.0);
//! record.insert("charts/episodic_return", RecordValue::Scalar(-1.0));
//! assert_eq!(record.get_scalar("global_step").unwrap(), 1000.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
