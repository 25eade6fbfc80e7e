//! Key-value records emitted by environments and evaluation loops.
//!
//! A [`Record`] plays the role of the `info` mapping of the conventional
//! control-loop interface: every environment step returns one, and
//! [`Recorder`]s collect them.
//!
//! ```rust
//! use border_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("step", RecordValue::Scalar(1.0));
//! record.insert("obs", RecordValue::Array1(vec![0.0, 0.1, 0.0, -0.1]));
//! assert_eq!(record.get_scalar("step").unwrap(), 1.0);
//! ```
mod base;
mod buffered_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use recorder::Recorder;
