//! Replay device for running the full stack without hardware.
//!
//! [`SimulatedDevice`] holds captured frames per channel mode and hands
//! them out in a loop, paced like a real line. It can also reproduce the
//! cross-talk a shared transceiver shows right after a mode switch.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::line::LINE_TERMINATOR;
use crate::traits::{ChannelMode, LineDevice};

/// Roughly one 40-byte frame at 9600 baud.
pub const DEFAULT_LINE_INTERVAL: Duration = Duration::from_millis(40);

#[derive(Debug, Default)]
struct Track {
    lines: Vec<Vec<u8>>,
    cursor: usize,
}

impl Track {
    fn next_line(&mut self) -> Option<Vec<u8>> {
        if self.lines.is_empty() {
            return None;
        }
        let line = self.lines[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.lines.len();
        Some(line)
    }
}

/// A [`LineDevice`] that replays captured lines for each channel mode.
#[derive(Debug)]
pub struct SimulatedDevice {
    tracks: HashMap<ChannelMode, Track>,
    active: Option<ChannelMode>,
    previous: Option<ChannelMode>,
    crosstalk: usize,
    crosstalk_left: usize,
    line_interval: Duration,
    switches: Vec<ChannelMode>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    /// An empty device: every read times out until a channel is loaded.
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            active: None,
            previous: None,
            crosstalk: 0,
            crosstalk_left: 0,
            line_interval: DEFAULT_LINE_INTERVAL,
            switches: Vec::new(),
        }
    }

    /// Load the lines replayed while `mode` is selected.
    pub fn with_channel(mut self, mode: ChannelMode, lines: Vec<Vec<u8>>) -> Self {
        self.tracks.insert(mode, Track { lines, cursor: 0 });
        self
    }

    /// Load raw captured wire bytes for `mode`.
    pub fn with_capture(self, mode: ChannelMode, capture: &[u8]) -> Self {
        self.with_channel(mode, split_capture(capture))
    }

    /// Load a capture file for `mode`.
    pub fn with_capture_file(self, mode: ChannelMode, path: impl AsRef<Path>) -> Result<Self> {
        let capture = std::fs::read(path.as_ref())?;
        Ok(self.with_capture(mode, &capture))
    }

    /// Delay applied to every read.
    pub fn with_line_interval(mut self, interval: Duration) -> Self {
        self.line_interval = interval;
        self
    }

    /// Serve this many lines from the previously selected channel after
    /// each mode switch.
    pub fn with_crosstalk(mut self, lines: usize) -> Self {
        self.crosstalk = lines;
        self
    }

    /// Every mode selected so far, in order.
    pub fn mode_switches(&self) -> &[ChannelMode] {
        &self.switches
    }

    /// The currently selected mode.
    pub fn active_mode(&self) -> Option<ChannelMode> {
        self.active
    }

    fn source_mode(&mut self) -> Option<ChannelMode> {
        if self.crosstalk_left > 0 && self.previous.is_some() {
            self.crosstalk_left -= 1;
            return self.previous;
        }
        self.active
    }
}

impl LineDevice for SimulatedDevice {
    fn set_channel_mode(&mut self, mode: ChannelMode) -> Result<()> {
        if self.active != Some(mode) {
            self.previous = self.active;
            self.active = Some(mode);
            self.crosstalk_left = self.crosstalk;
        }
        self.switches.push(mode);
        debug!(%mode, "simulated channel selected");
        Ok(())
    }

    fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>> {
        std::thread::sleep(self.line_interval);
        let line = self
            .source_mode()
            .and_then(|mode| self.tracks.get_mut(&mode))
            .and_then(Track::next_line);
        match line {
            Some(mut line) => {
                line.truncate(max_len.max(1));
                Ok(line)
            }
            None => Err(TransportError::Timeout),
        }
    }
}

/// Split a raw capture into lines, each ending at the line terminator.
///
/// A trailing fragment is kept only if it carries more than whitespace.
pub fn split_capture(capture: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = capture
        .split_inclusive(|&b| b == LINE_TERMINATOR)
        .map(<[u8]>::to_vec)
        .collect();
    if let Some(last) = lines.last() {
        if last.last() != Some(&LINE_TERMINATOR) && last.iter().all(u8::is_ascii_whitespace) {
            lines.pop();
        }
    }
    lines
}
