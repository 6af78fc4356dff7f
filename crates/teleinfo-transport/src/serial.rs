use std::time::Duration;

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::line::LineReader;
use crate::traits::{ChannelMode, LineDevice};

/// TeleInfo standard mode line speed.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Per-read wait before the driver reports a timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// How a channel mode is applied to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSelect {
    /// Drive the modem control lines from the mode bits
    /// (bit 0 → RTS, bit 1 → DTR).
    ControlLines,
    /// Leave the lines alone; the interface carries a single channel or is
    /// multiplexed externally.
    None,
}

/// Serial parameters for a TeleInfo interface.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Bounded wait for each driver read.
    pub read_timeout: Duration,
    pub mode_select: ModeSelect,
}

impl SerialConfig {
    /// Standard-mode defaults (9600 baud, 7E1) for the given device path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::One,
            read_timeout: DEFAULT_READ_TIMEOUT,
            mode_select: ModeSelect::ControlLines,
        }
    }
}

/// A TeleInfo interface reached through a serial port.
pub struct SerialDevice {
    reader: LineReader<Box<dyn SerialPort>>,
    config: SerialConfig,
}

impl SerialDevice {
    /// Open the port described by `config`.
    pub fn open(config: SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: config.path.clone(),
                source,
            })?;

        info!(
            path = %config.path,
            baud = config.baud_rate,
            "opened teleinfo interface"
        );

        Ok(Self {
            reader: LineReader::new(port),
            config,
        })
    }

    /// The configuration this device was opened with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl LineDevice for SerialDevice {
    fn set_channel_mode(&mut self, mode: ChannelMode) -> Result<()> {
        let port = self.reader.get_mut();
        if self.config.mode_select == ModeSelect::ControlLines {
            let (rts, dtr) = control_lines(mode);
            port.write_request_to_send(rts)
                .and_then(|_| port.write_data_terminal_ready(dtr))
                .map_err(|source| TransportError::ModeSwitch { mode, source })?;
        }
        port.clear(ClearBuffer::Input)
            .map_err(|source| TransportError::ModeSwitch { mode, source })?;
        let dropped = self.reader.discard_buffered();
        debug!(%mode, dropped, "channel mode selected");
        Ok(())
    }

    fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>> {
        self.reader.read_line(max_len)
    }
}

/// RTS and DTR levels for a mode value.
pub fn control_lines(mode: ChannelMode) -> (bool, bool) {
    let raw = mode.raw();
    (raw & 0x01 != 0, raw & 0x02 != 0)
}
