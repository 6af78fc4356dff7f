use crate::traits::ChannelMode;

/// Errors raised by a TeleInfo device.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// No byte arrived before the per-read timeout elapsed.
    #[error("no data before read timeout")]
    Timeout,

    /// An I/O error occurred while reading the device.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device stream reached end-of-file.
    #[error("device disconnected")]
    Disconnected,

    /// The hardware refused the channel mode switch.
    #[error("failed to select channel mode {mode}: {source}")]
    ModeSwitch {
        mode: ChannelMode,
        source: serialport::Error,
    },
}

impl TransportError {
    /// Whether this failure warrants a cooldown before the next attempt.
    ///
    /// A quiet line only produces [`TransportError::Timeout`]; everything
    /// else means the hardware itself is in trouble.
    pub fn is_hard(&self) -> bool {
        !matches!(self, TransportError::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_soft() {
        assert!(!TransportError::Timeout.is_hard());
    }

    #[test]
    fn io_and_disconnect_are_hard() {
        let io = TransportError::Io(std::io::Error::other("usb reset"));
        assert!(io.is_hard());
        assert!(TransportError::Disconnected.is_hard());
    }

    #[test]
    fn mode_switch_message_names_mode() {
        let err = TransportError::ModeSwitch {
            mode: ChannelMode::new(0x22),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
        };
        assert!(err.to_string().contains("0x22"));
    }
}
