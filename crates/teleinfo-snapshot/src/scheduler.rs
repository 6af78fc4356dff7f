use std::sync::atomic::{AtomicBool, Ordering};

use teleinfo_frame::FrameReader;
use teleinfo_transport::LineDevice;
use tracing::{debug, info};

use crate::assembler::{ScanReport, SnapshotAssembler};
use crate::channel::{ChannelKind, ChannelProfile};
use crate::clock::Clock;
use crate::config::ScanConfig;
use crate::publish::Publisher;
use crate::sink::{Anomaly, ErrorSink};
use crate::snapshot::Snapshot;

/// What happened to a channel's snapshot at the end of its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// Handed to the publisher.
    Sent,
    /// Withheld because the critical field was empty.
    Suppressed,
    /// The publisher returned an error.
    Failed,
    /// The channel could not be selected; nothing was scanned.
    Skipped,
}

/// One channel's share of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub kind: ChannelKind,
    /// `None` when the channel was skipped.
    pub scan: Option<ScanReport>,
    pub publication: Publication,
}

/// Outcome of one pass over every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub channels: Vec<ChannelReport>,
}

impl CycleReport {
    pub fn channel(&self, kind: ChannelKind) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.kind == kind)
    }

    /// Number of snapshots handed to the publisher.
    pub fn published(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| c.publication == Publication::Sent)
            .count()
    }
}

/// Time-shares one transceiver between the channels.
///
/// Every cycle visits the channels in order: select the channel's mode,
/// flush what the previous channel left in the pipe, scan, publish. The
/// scheduler is the only writer of the snapshots.
pub struct ChannelScheduler<D, P, S, C> {
    reader: FrameReader<D>,
    assemblers: Vec<SnapshotAssembler>,
    publisher: P,
    sink: S,
    clock: C,
    config: ScanConfig,
}

impl<D, P, S, C> ChannelScheduler<D, P, S, C>
where
    D: LineDevice,
    P: Publisher,
    S: ErrorSink,
    C: Clock,
{
    /// Consumption then production, default timings.
    pub fn new(reader: FrameReader<D>, publisher: P, sink: S, clock: C) -> Self {
        Self {
            reader,
            assemblers: ChannelKind::ALL
                .iter()
                .map(|&kind| SnapshotAssembler::new(ChannelProfile::for_kind(kind)))
                .collect(),
            publisher,
            sink,
            clock,
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the channel list. Channels are serviced in the given order
    /// and their snapshots start out blank.
    pub fn with_profiles<I>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = ChannelProfile>,
    {
        self.assemblers = profiles.into_iter().map(SnapshotAssembler::new).collect();
        self
    }

    /// Service every channel once.
    ///
    /// Does not sleep; [`run`](Self::run) spaces cycles by the configured
    /// interval.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut channels = Vec::with_capacity(self.assemblers.len());
        for assembler in &mut self.assemblers {
            channels.push(service_channel(
                assembler,
                &mut self.reader,
                &mut self.publisher,
                &mut self.sink,
                &self.clock,
                &self.config,
            ));
        }
        CycleReport { channels }
    }

    /// Run cycles until `running` is cleared or `max_cycles` have completed.
    ///
    /// The flag is only checked between cycles; a cycle in progress always
    /// finishes. Returns the number of completed cycles.
    pub fn run(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> u64 {
        let mut cycles = 0u64;
        let more =
            |n: u64| running.load(Ordering::SeqCst) && max_cycles.map_or(true, |max| n < max);

        while more(cycles) {
            let report = self.run_cycle();
            cycles += 1;
            debug!(cycle = cycles, published = report.published(), "cycle finished");
            if more(cycles) {
                self.clock.sleep(self.config.cycle_interval);
            }
        }

        info!(cycles, "scheduler stopped");
        cycles
    }

    /// Latest snapshot for `kind`, if that channel is scheduled.
    pub fn snapshot(&self, kind: ChannelKind) -> Option<&Snapshot> {
        self.assemblers
            .iter()
            .find(|a| a.kind() == kind)
            .map(SnapshotAssembler::snapshot)
    }

    pub fn assemblers(&self) -> &[SnapshotAssembler] {
        &self.assemblers
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn reader(&self) -> &FrameReader<D> {
        &self.reader
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

fn service_channel<D, P, S, C>(
    assembler: &mut SnapshotAssembler,
    reader: &mut FrameReader<D>,
    publisher: &mut P,
    sink: &mut S,
    clock: &C,
    config: &ScanConfig,
) -> ChannelReport
where
    D: LineDevice,
    P: Publisher,
    S: ErrorSink,
    C: Clock,
{
    let kind = assembler.kind();
    let mode = assembler.profile().mode;

    // Scanning on whatever channel is still selected would mix streams.
    if let Err(err) = reader.set_channel_mode(mode) {
        sink.report(Anomaly::transport(kind, &err));
        return ChannelReport {
            kind,
            scan: None,
            publication: Publication::Skipped,
        };
    }
    debug!(channel = %kind, %mode, "channel selected");

    assembler.flush(reader, sink, clock, config.flush_duration);
    let scan = assembler.scan(reader, sink, clock, config.scan_timeout);
    let publication = publish_snapshot(assembler, publisher, sink);

    ChannelReport {
        kind,
        scan: Some(scan),
        publication,
    }
}

fn publish_snapshot<P, S>(
    assembler: &SnapshotAssembler,
    publisher: &mut P,
    sink: &mut S,
) -> Publication
where
    P: Publisher,
    S: ErrorSink,
{
    let snapshot = assembler.snapshot();
    let kind = snapshot.kind();

    if let Some(tag) = assembler.profile().critical_tag.as_deref() {
        if snapshot.is_blank(tag) {
            let blank = snapshot.blank_tags().count();
            sink.report(Anomaly::EmptyCriticalField {
                channel: kind,
                tag: tag.to_string(),
                context: format!("{} of {} fields set", snapshot.len() - blank, snapshot.len()),
            });
            return Publication::Suppressed;
        }
    }

    match publisher.publish(snapshot) {
        Ok(()) => Publication::Sent,
        Err(err) => {
            sink.report(Anomaly::PublishFailed {
                channel: kind,
                detail: err.to_string(),
            });
            Publication::Failed
        }
    }
}
