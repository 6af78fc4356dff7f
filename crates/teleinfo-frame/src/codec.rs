use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use teleinfo_transport::LINE_TERMINATOR;

use crate::checksum::compute_checksum;

/// Frame start byte (LF).
pub const START: u8 = 0x0A;

/// Field separator (HT). Also closes the checksum scope.
pub const SEP: u8 = 0x09;

/// Frame end byte (CR).
pub const END: u8 = LINE_TERMINATOR;

/// Default cap on a single raw line. Long enough for every standard-mode
/// frame, including the 98-byte calendar frames.
pub const DEFAULT_MAX_LINE_LEN: usize = 128;

/// The content of one frame, without its start and end bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Extract the frame carried by a raw line.
    ///
    /// Anything before the last start byte is noise from a truncated
    /// predecessor and is dropped, as is everything from the end byte on.
    /// A line missing either marker still yields a frame; it simply fails
    /// validation later.
    pub fn from_line(line: &[u8]) -> Self {
        let body = match line.iter().rposition(|&b| b == START) {
            Some(pos) => &line[pos + 1..],
            None => line,
        };
        let body = match body.iter().position(|&b| b == END) {
            Some(pos) => &body[..pos],
            None => body,
        };
        Self {
            data: Bytes::copy_from_slice(body),
        }
    }

    /// Raw frame content between the markers.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The trailing checksum byte, if the frame has any content.
    pub fn checksum(&self) -> Option<u8> {
        self.data.last().copied()
    }

    /// Everything the checksum covers: tag, values and the separator
    /// right before the checksum byte.
    pub fn checksum_scope(&self) -> &[u8] {
        match self.data.len() {
            0 => &[],
            n => &self.data[..n - 1],
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.escape_ascii())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬─────┬─────┬────────┬─────────────┬─────┬──────────┬──────┐
/// │ 0x0A │ TAG │ SEP │ VALUE1 │ [SEP VALUE] │ SEP │ CHECKSUM │ 0x0D │
/// └──────┴─────┴─────┴────────┴─────────────┴─────┴──────────┴──────┘
/// ```
pub fn encode_frame(tag: &str, values: &[&str], dst: &mut BytesMut) {
    let start = dst.len();
    dst.put_u8(START);
    dst.put_slice(tag.as_bytes());
    for value in values {
        dst.put_u8(SEP);
        dst.put_slice(value.as_bytes());
    }
    dst.put_u8(SEP);
    let checksum = compute_checksum(&dst[start + 1..]);
    dst.put_u8(checksum);
    dst.put_u8(END);
}

/// Configuration for frame reading.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum bytes requested from the device per line.
    pub max_line_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}
