use std::time::Duration;

use teleinfo_frame::{FrameError, FrameReader, TagValue};
use teleinfo_transport::LineDevice;
use tracing::{debug, trace};

use crate::channel::{ChannelKind, ChannelProfile};
use crate::clock::Clock;
use crate::sink::{Anomaly, ErrorSink};
use crate::snapshot::{Snapshot, WorkingSet};

/// Where an assembler is in its flush/scan sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Flushing,
    Scanning,
    Complete,
    TimedOut,
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every required tag was read.
    Complete,
    /// The deadline passed first; these tags kept their previous values.
    TimedOut { unresolved: Vec<String> },
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, ScanOutcome::Complete)
    }

    pub fn unresolved(&self) -> &[String] {
        match self {
            ScanOutcome::Complete => &[],
            ScanOutcome::TimedOut { unresolved } => unresolved,
        }
    }
}

/// Result and counters of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub elapsed: Duration,
    /// Frames that passed validation, required or not.
    pub frames: usize,
    pub checksum_errors: usize,
    pub transport_errors: usize,
    pub malformed: usize,
}

/// Owns one channel's snapshot and fills it from the line.
pub struct SnapshotAssembler {
    profile: ChannelProfile,
    snapshot: Snapshot,
    state: ScanState,
}

impl SnapshotAssembler {
    pub fn new(profile: ChannelProfile) -> Self {
        let snapshot = Snapshot::for_profile(&profile);
        Self {
            profile,
            snapshot,
            state: ScanState::Idle,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &ChannelProfile {
        &self.profile
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Discard every line read during `window`.
    ///
    /// Bytes queued while the other channel was selected end up here
    /// instead of in this channel's snapshot. Returns the number of lines
    /// dropped.
    pub fn flush<D, S, C>(
        &mut self,
        reader: &mut FrameReader<D>,
        sink: &mut S,
        clock: &C,
        window: Duration,
    ) -> usize
    where
        D: LineDevice,
        S: ErrorSink,
        C: Clock,
    {
        self.state = ScanState::Flushing;
        let started = clock.now();
        let mut discarded = 0usize;

        while clock.now().duration_since(started) < window {
            match reader.read_frame() {
                Ok(_) => discarded += 1,
                Err(FrameError::Transport(err)) => {
                    sink.report(Anomaly::transport(self.profile.kind, &err))
                }
                Err(_) => discarded += 1,
            }
        }

        debug!(channel = %self.profile.kind, discarded, "flushed stale lines");
        discarded
    }

    /// Collect the required tags until all are seen or `timeout` elapses.
    ///
    /// Only checksum-valid frames touch the snapshot. A required tag seen
    /// twice keeps the later value. Tags not seen before the deadline keep
    /// whatever they held before the scan.
    pub fn scan<D, S, C>(
        &mut self,
        reader: &mut FrameReader<D>,
        sink: &mut S,
        clock: &C,
        timeout: Duration,
    ) -> ScanReport
    where
        D: LineDevice,
        S: ErrorSink,
        C: Clock,
    {
        let kind = self.profile.kind;
        let mut working = WorkingSet::new(&self.profile.required_tags);
        let mut frames = 0usize;
        let mut checksum_errors = 0usize;
        let mut transport_errors = 0usize;
        let mut malformed = 0usize;

        self.state = ScanState::Scanning;
        let started = clock.now();

        while !working.is_empty() && clock.now().duration_since(started) < timeout {
            match reader.next_tag_value() {
                Ok(TagValue { tag, value }) => {
                    frames += 1;
                    if self.snapshot.replace(&tag, &value) {
                        working.resolve(&tag);
                        sink.clear();
                    }
                }
                Err(FrameError::Transport(err)) => {
                    transport_errors += 1;
                    sink.report(Anomaly::transport(kind, &err));
                }
                Err(FrameError::Checksum { frame }) => {
                    checksum_errors += 1;
                    sink.report(Anomaly::Checksum {
                        channel: kind,
                        frame,
                    });
                }
                Err(FrameError::Malformed { tokens }) => {
                    malformed += 1;
                    trace!(channel = %kind, tokens, "skipping malformed frame");
                }
            }
        }

        let outcome = if working.is_empty() {
            self.state = ScanState::Complete;
            ScanOutcome::Complete
        } else {
            self.state = ScanState::TimedOut;
            let unresolved = working.into_pending();
            sink.report(Anomaly::IncompleteScan {
                channel: kind,
                unresolved: unresolved.len(),
            });
            ScanOutcome::TimedOut { unresolved }
        };

        let elapsed = clock.now().duration_since(started);
        debug!(
            channel = %kind,
            complete = outcome.is_complete(),
            frames,
            checksum_errors,
            ?elapsed,
            "scan finished"
        );

        ScanReport {
            outcome,
            elapsed,
            frames,
            checksum_errors,
            transport_errors,
            malformed,
        }
    }
}
