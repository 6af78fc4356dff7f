use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use teleinfo_transport::serial::DEFAULT_BAUD_RATE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll both channels and publish their snapshots.
    Run(RunArgs),
    /// Validate and decode a raw capture.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where snapshots go.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PublishTarget {
    /// UDP datagram to the broadcast target.
    Udp,
    /// Standard output, in the selected output format.
    Stdout,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serial device of the TeleInfo interface.
    #[arg(long, value_name = "PATH", env = "TELEINFO_DEVICE")]
    pub device: Option<String>,
    /// Line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Do not drive RTS/DTR on channel switches (single-channel interfaces).
    #[arg(long)]
    pub no_mode_lines: bool,
    /// Destination of published snapshots.
    #[arg(long, value_enum, default_value = "udp")]
    pub publish: PublishTarget,
    /// UDP target for `--publish udp`.
    #[arg(long, env = "TELEINFO_BROADCAST", default_value = "255.255.255.255:65432")]
    pub broadcast: SocketAddr,
    /// Budget for collecting one channel's tags (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub scan_timeout: String,
    /// Lines are discarded for this long after each channel switch.
    #[arg(long, default_value = "1s")]
    pub flush: String,
    /// Pause between cycles.
    #[arg(long, default_value = "3s")]
    pub interval: String,
    /// Stop after N cycles. Default: run until interrupted.
    #[arg(long)]
    pub cycles: Option<u64>,
    /// Replay this capture as the consumption channel instead of opening a device.
    #[arg(long, value_name = "FILE")]
    pub simulate_consumption: Option<PathBuf>,
    /// Replay this capture as the production channel instead of opening a device.
    #[arg(long, value_name = "FILE")]
    pub simulate_production: Option<PathBuf>,
    /// Delay between simulated lines.
    #[arg(long, default_value = "40ms")]
    pub line_interval: String,
    /// Simulated lines leaking from the previous channel after a switch.
    #[arg(long, default_value_t = 0)]
    pub crosstalk: usize,
}

impl RunArgs {
    pub fn is_simulated(&self) -> bool {
        self.simulate_consumption.is_some() || self.simulate_production.is_some()
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file of raw wire bytes. Default: stdin.
    pub file: Option<PathBuf>,
    /// Fail with a data error if any frame is invalid.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
