use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use teleinfo_frame::FrameReader;
use teleinfo_snapshot::{
    ChannelScheduler, LogPolicy, LogSink, Publisher, ScanConfig, SystemClock, UdpPublisher,
    CONSUMPTION_MODE, PRODUCTION_MODE,
};
use teleinfo_transport::{
    LineDevice, ModeSelect, SerialConfig, SerialDevice, SimulatedDevice,
};
use tracing::info;

use crate::cmd::{PublishTarget, RunArgs};
use crate::exit::{publish_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{OutputFormat, StdoutPublisher};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = scan_config(&args)?;
    let device = open_device(&args)?;
    let publisher = open_publisher(&args, format)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let sink = LogSink::new(LogPolicy::default(), SystemClock);
    let mut scheduler =
        ChannelScheduler::new(FrameReader::new(device), publisher, sink, SystemClock)
            .with_config(config);

    info!(
        scan_timeout = ?config.scan_timeout,
        flush = ?config.flush_duration,
        interval = ?config.cycle_interval,
        "teleinfo started"
    );
    scheduler.run(&running, args.cycles);

    Ok(SUCCESS)
}

fn scan_config(args: &RunArgs) -> CliResult<ScanConfig> {
    Ok(ScanConfig {
        scan_timeout: parse_duration(&args.scan_timeout)?,
        flush_duration: parse_duration(&args.flush)?,
        cycle_interval: parse_duration(&args.interval)?,
    })
}

fn open_device(args: &RunArgs) -> CliResult<Box<dyn LineDevice>> {
    if args.is_simulated() {
        let mut device = SimulatedDevice::new()
            .with_line_interval(parse_duration(&args.line_interval)?)
            .with_crosstalk(args.crosstalk);
        for (mode, capture) in [
            (CONSUMPTION_MODE, &args.simulate_consumption),
            (PRODUCTION_MODE, &args.simulate_production),
        ] {
            if let Some(path) = capture {
                device = device.with_capture_file(mode, path).map_err(|err| {
                    transport_error(&format!("cannot load capture {}", path.display()), err)
                })?;
            }
        }
        info!("using simulated device");
        return Ok(Box::new(device));
    }

    let Some(path) = args.device.as_deref() else {
        return Err(CliError::new(
            USAGE,
            "no device: pass --device (or TELEINFO_DEVICE) or a --simulate-* capture",
        ));
    };

    let mut config = SerialConfig::new(path);
    config.baud_rate = args.baud;
    if args.no_mode_lines {
        config.mode_select = ModeSelect::None;
    }
    let device =
        SerialDevice::open(config).map_err(|err| transport_error("cannot open device", err))?;
    Ok(Box::new(device))
}

fn open_publisher(args: &RunArgs, format: OutputFormat) -> CliResult<Box<dyn Publisher>> {
    match args.publish {
        PublishTarget::Stdout => Ok(Box::new(StdoutPublisher::new(format))),
        PublishTarget::Udp => {
            let publisher = UdpPublisher::bind(args.broadcast)
                .map_err(|err| publish_error("cannot prepare publisher", err))?;
            info!(broadcast = %publisher.target(), "publishing over udp");
            Ok(Box::new(publisher))
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
