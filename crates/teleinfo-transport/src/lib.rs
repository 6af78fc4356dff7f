//! Line-oriented device abstraction for two-channel TeleInfo interfaces.
//!
//! Both meter outputs (consumption and production) share a single
//! transceiver. A device therefore exposes exactly two operations: select
//! which channel is routed to the receiver, and read one raw line with a
//! bounded wait.
//!
//! This is the lowest layer of the stack. Frame validation and tag
//! extraction live in `teleinfo-frame`, snapshot assembly in
//! `teleinfo-snapshot`.

pub mod error;
pub mod line;
pub mod serial;
pub mod sim;
pub mod traits;

pub use error::{Result, TransportError};
pub use line::{LineReader, LINE_TERMINATOR};
pub use serial::{ModeSelect, SerialConfig, SerialDevice};
pub use sim::{split_capture, SimulatedDevice};
pub use traits::{ChannelMode, LineDevice};
