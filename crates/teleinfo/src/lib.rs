//! Two-channel TeleInfo decoder and snapshot broadcaster.
//!
//! Reads the consumption and production TeleInfo streams of an electricity
//! meter through one shared transceiver, validates every frame, and
//! publishes a snapshot per channel.
//!
//! # Crate Structure
//!
//! - [`transport`]: Device abstraction (serial port, simulator, line reader)
//! - [`frame`]: Frame extraction, checksum validation, tag parsing
//! - [`snapshot`]: Snapshot assembly, channel scheduling, publication

/// Re-export transport types.
pub mod transport {
    pub use teleinfo_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use teleinfo_frame::*;
}

/// Re-export snapshot types.
pub mod snapshot {
    pub use teleinfo_snapshot::*;
}
