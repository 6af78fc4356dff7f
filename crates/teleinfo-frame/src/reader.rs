use teleinfo_transport::{ChannelMode, LineDevice};
use tracing::trace;

use crate::checksum::check;
use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::tag::{parse, TagValue};

/// Pulls frames off a [`LineDevice`].
///
/// Each call consumes exactly one device line, so a garbled line costs one
/// read and never desynchronises the stream.
pub struct FrameReader<D> {
    device: D,
    config: FrameConfig,
}

impl<D: LineDevice> FrameReader<D> {
    /// Create a new frame reader with default configuration.
    pub fn new(device: D) -> Self {
        Self::with_config(device, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(device: D, config: FrameConfig) -> Self {
        Self { device, config }
    }

    /// Read the next raw frame, valid or not.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let line = self.device.read_line(self.config.max_line_len)?;
        Ok(Frame::from_line(&line))
    }

    /// Read the next frame and, if its checksum holds, extract its
    /// tag/value pair.
    ///
    /// A checksum failure yields [`FrameError::Checksum`] without parsing;
    /// empty or field-starved frames yield [`FrameError::Malformed`].
    pub fn next_tag_value(&mut self) -> Result<TagValue> {
        let frame = self.read_frame()?;
        if frame.is_empty() {
            return Err(FrameError::Malformed { tokens: 0 });
        }
        if !check(&frame) {
            return Err(FrameError::Checksum {
                frame: frame.to_string(),
            });
        }
        let pair = parse(&frame)?;
        trace!(tag = %pair.tag, value = %pair.value, "frame decoded");
        Ok(pair)
    }

    /// Route another channel to the receiver.
    pub fn set_channel_mode(&mut self, mode: ChannelMode) -> teleinfo_transport::Result<()> {
        self.device.set_channel_mode(mode)
    }

    /// Borrow the underlying device.
    pub fn get_ref(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the underlying device.
    pub fn get_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Consume the reader and return the device.
    pub fn into_inner(self) -> D {
        self.device
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
