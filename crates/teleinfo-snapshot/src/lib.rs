//! Two-channel TeleInfo snapshot assembly.
//!
//! One [`SnapshotAssembler`] per channel owns that channel's [`Snapshot`]
//! and fills it during bounded scans. The [`ChannelScheduler`] time-shares
//! the single transceiver between the two channels: select mode, flush,
//! scan, publish, then the other channel, then sleep.

pub mod assembler;
pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod publish;
pub mod scheduler;
pub mod sink;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use assembler::{ScanOutcome, ScanReport, ScanState, SnapshotAssembler};
pub use channel::{
    ChannelKind, ChannelProfile, CONSUMPTION_MODE, CONSUMPTION_TAGS, PRODUCTION_MODE,
    PRODUCTION_TAGS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LogPolicy, ScanConfig};
pub use error::{PublishError, Result};
pub use publish::{Publisher, UdpPublisher, DEFAULT_BROADCAST_PORT};
pub use scheduler::{ChannelReport, ChannelScheduler, CycleReport, Publication};
pub use sink::{Anomaly, ErrorCounter, ErrorSink, LogSink};
pub use snapshot::{Snapshot, WorkingSet};
