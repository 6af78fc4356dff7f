use std::fmt;

use crate::error::Result;

/// Opaque hardware selector for one of the two multiplexed channels.
///
/// The value is interpreted only by the device implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMode(u8);

impl ChannelMode {
    /// Wrap a raw mode value.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw mode value handed to the hardware.
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// A TeleInfo interface: one receiver, two switchable channels.
///
/// Implementations must bound every call to [`LineDevice::read_line`]; a
/// quiet line yields [`TransportError::Timeout`](crate::TransportError::Timeout)
/// rather than blocking forever.
pub trait LineDevice {
    /// Route the given channel to the receiver.
    fn set_channel_mode(&mut self, mode: ChannelMode) -> Result<()>;

    /// Read raw bytes up to and including the line terminator, or at most
    /// `max_len` bytes, whichever comes first.
    fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>>;
}

impl<D: LineDevice + ?Sized> LineDevice for &mut D {
    fn set_channel_mode(&mut self, mode: ChannelMode) -> Result<()> {
        (**self).set_channel_mode(mode)
    }

    fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).read_line(max_len)
    }
}

impl<D: LineDevice + ?Sized> LineDevice for Box<D> {
    fn set_channel_mode(&mut self, mode: ChannelMode) -> Result<()> {
        (**self).set_channel_mode(mode)
    }

    fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).read_line(max_len)
    }
}
