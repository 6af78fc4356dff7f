//! Scripted collaborators for deterministic tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bytes::BytesMut;
use teleinfo_frame::encode_frame;
use teleinfo_transport::{ChannelMode, LineDevice, TransportError};

use crate::clock::ManualClock;
use crate::error::{PublishError, Result};
use crate::publish::Publisher;
use crate::sink::{Anomaly, ErrorSink};
use crate::snapshot::Snapshot;

pub(crate) const STEP: Duration = Duration::from_millis(100);

pub(crate) fn wire(tag: &str, values: &[&str]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(tag, values, &mut buf);
    buf.to_vec()
}

/// Replays per-mode scripts; every read advances the shared clock by
/// [`STEP`]. An exhausted script times out.
pub(crate) struct ScriptedDevice {
    clock: ManualClock,
    tracks: HashMap<ChannelMode, VecDeque<teleinfo_transport::Result<Vec<u8>>>>,
    active: Option<ChannelMode>,
    pub switches: Vec<ChannelMode>,
    pub reject_mode: Option<ChannelMode>,
}

impl ScriptedDevice {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            tracks: HashMap::new(),
            active: None,
            switches: Vec::new(),
            reject_mode: None,
        }
    }

    pub fn with_lines(mut self, mode: ChannelMode, lines: Vec<Vec<u8>>) -> Self {
        self.tracks
            .entry(mode)
            .or_default()
            .extend(lines.into_iter().map(Ok));
        self
    }

    pub fn with_error(mut self, mode: ChannelMode, err: TransportError) -> Self {
        self.tracks.entry(mode).or_default().push_back(Err(err));
        self
    }

    /// Start reading `mode` without recording a switch.
    pub fn tuned_to(mut self, mode: ChannelMode) -> Self {
        self.active = Some(mode);
        self
    }
}

impl LineDevice for ScriptedDevice {
    fn set_channel_mode(&mut self, mode: ChannelMode) -> teleinfo_transport::Result<()> {
        if self.reject_mode == Some(mode) {
            return Err(TransportError::ModeSwitch {
                mode,
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "unplugged"),
            });
        }
        self.active = Some(mode);
        self.switches.push(mode);
        Ok(())
    }

    fn read_line(&mut self, _max_len: usize) -> teleinfo_transport::Result<Vec<u8>> {
        self.clock.advance(STEP);
        self.active
            .and_then(|mode| self.tracks.get_mut(&mode))
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(TransportError::Timeout))
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub anomalies: Vec<Anomaly>,
    pub clears: usize,
}

impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&Anomaly) -> bool) -> usize {
        self.anomalies.iter().filter(|a| pred(a)).count()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&mut self, anomaly: Anomaly) {
        self.anomalies.push(anomaly);
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingPublisher {
    pub published: Vec<Snapshot>,
    pub fail: bool,
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<()> {
        if self.fail {
            return Err(PublishError::Io(std::io::Error::other("sink closed")));
        }
        self.published.push(snapshot.clone());
        Ok(())
    }
}
