//! Anomaly reporting with log suppression.
//!
//! A flaky cable produces the same failure many times a second. The
//! [`LogSink`] logs the first few occurrences of a streak, then only every
//! `cadence`-th one, and the streak resets as soon as a good frame lands.

use std::fmt;

use teleinfo_transport::TransportError;
use tracing::{error, warn};

use crate::channel::ChannelKind;
use crate::clock::Clock;
use crate::config::LogPolicy;

/// Something that went wrong while servicing a channel. None of these stop
/// the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A device read or mode switch failed.
    Transport {
        channel: ChannelKind,
        hard: bool,
        detail: String,
    },
    /// A frame failed checksum validation.
    Checksum { channel: ChannelKind, frame: String },
    /// The scan deadline passed with tags still missing.
    IncompleteScan {
        channel: ChannelKind,
        unresolved: usize,
    },
    /// Publication was withheld because a critical field is empty.
    EmptyCriticalField {
        channel: ChannelKind,
        tag: String,
        context: String,
    },
    /// The publisher failed.
    PublishFailed { channel: ChannelKind, detail: String },
}

impl Anomaly {
    pub fn transport(channel: ChannelKind, err: &TransportError) -> Self {
        Anomaly::Transport {
            channel,
            hard: err.is_hard(),
            detail: err.to_string(),
        }
    }

    pub fn channel(&self) -> ChannelKind {
        match self {
            Anomaly::Transport { channel, .. }
            | Anomaly::Checksum { channel, .. }
            | Anomaly::IncompleteScan { channel, .. }
            | Anomaly::EmptyCriticalField { channel, .. }
            | Anomaly::PublishFailed { channel, .. } => *channel,
        }
    }

    /// Hard failures are followed by a cooldown.
    pub fn is_hard(&self) -> bool {
        matches!(self, Anomaly::Transport { hard: true, .. })
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::Transport { detail, .. } => write!(f, "cannot read teleinfo stream ({detail})"),
            Anomaly::Checksum { frame, .. } => {
                write!(f, "checksum problem, check wiring (frame \"{frame}\")")
            }
            Anomaly::IncompleteScan { unresolved, .. } => {
                write!(f, "not all tags found, unread tags: {unresolved}")
            }
            Anomaly::EmptyCriticalField { tag, context, .. } => {
                write!(f, "empty {tag}, publication suppressed ({context})")
            }
            Anomaly::PublishFailed { detail, .. } => write!(f, "publication failed ({detail})"),
        }
    }
}

/// Receives anomalies from the scan loop and the scheduler.
pub trait ErrorSink {
    /// Record one anomaly.
    fn report(&mut self, anomaly: Anomaly);

    /// A validated, required tag was just stored; the streak is over.
    fn clear(&mut self);
}

impl<S: ErrorSink + ?Sized> ErrorSink for &mut S {
    fn report(&mut self, anomaly: Anomaly) {
        (**self).report(anomaly)
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

/// Length of the current streak of anomalies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCounter {
    count: u64,
}

impl ErrorCounter {
    /// Count one more anomaly and return the new streak length.
    pub fn record(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl LogPolicy {
    /// Whether the `occurrence`-th anomaly of a streak gets logged.
    pub fn should_log(&self, occurrence: u64) -> bool {
        occurrence <= self.verbose_limit || (self.cadence > 0 && occurrence % self.cadence == 0)
    }
}

/// [`ErrorSink`] writing to `tracing`, throttled by a [`LogPolicy`].
#[derive(Debug)]
pub struct LogSink<C> {
    counter: ErrorCounter,
    policy: LogPolicy,
    clock: C,
}

impl<C: Clock> LogSink<C> {
    pub fn new(policy: LogPolicy, clock: C) -> Self {
        Self {
            counter: ErrorCounter::default(),
            policy,
            clock,
        }
    }

    pub fn counter(&self) -> ErrorCounter {
        self.counter
    }

    pub fn policy(&self) -> &LogPolicy {
        &self.policy
    }
}

impl<C: Clock> ErrorSink for LogSink<C> {
    fn report(&mut self, anomaly: Anomaly) {
        let occurrences = self.counter.record();
        if !self.policy.should_log(occurrences) {
            return;
        }

        let channel = anomaly.channel();
        if anomaly.is_hard() {
            error!(
                %channel,
                occurrences,
                cooldown = ?self.policy.cooldown,
                "{anomaly}"
            );
            self.clock.sleep(self.policy.cooldown);
        } else {
            warn!(%channel, occurrences, "{anomaly}");
        }
    }

    fn clear(&mut self) {
        self.counter.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;

    fn checksum_anomaly() -> Anomaly {
        Anomaly::Checksum {
            channel: ChannelKind::Consumption,
            frame: "SINSTS\\t00290\\tR".to_string(),
        }
    }

    fn hard_anomaly() -> Anomaly {
        Anomaly::transport(ChannelKind::Production, &TransportError::Disconnected)
    }

    #[test]
    fn policy_logs_first_five_then_every_fiftieth() {
        let policy = LogPolicy::default();
        let logged: Vec<u64> = (1..=200).filter(|&n| policy.should_log(n)).collect();
        assert_eq!(logged, vec![1, 2, 3, 4, 5, 50, 100, 150, 200]);
    }

    #[test]
    fn zero_cadence_only_logs_verbose_prefix() {
        let policy = LogPolicy {
            cadence: 0,
            ..LogPolicy::default()
        };
        assert!(policy.should_log(5));
        assert!(!policy.should_log(50));
    }

    #[test]
    fn counter_is_monotonic_until_reset() {
        let mut counter = ErrorCounter::default();
        assert_eq!(counter.record(), 1);
        assert_eq!(counter.record(), 2);
        counter.reset();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.record(), 1);
    }

    #[test]
    fn every_report_counts_and_clear_resets() {
        let mut sink = LogSink::new(LogPolicy::default(), ManualClock::new());
        for _ in 0..7 {
            sink.report(checksum_anomaly());
        }
        assert_eq!(sink.counter().count(), 7);

        sink.clear();
        assert_eq!(sink.counter().count(), 0);
    }

    #[test]
    fn logged_hard_failure_triggers_cooldown() {
        let clock = ManualClock::new();
        let mut sink = LogSink::new(LogPolicy::default(), clock.clone());
        let t0 = clock.now();

        sink.report(hard_anomaly());
        assert_eq!(clock.now() - t0, Duration::from_secs(60));
    }

    #[test]
    fn soft_anomalies_never_pause() {
        let clock = ManualClock::new();
        let mut sink = LogSink::new(LogPolicy::default(), clock.clone());
        let t0 = clock.now();

        sink.report(checksum_anomaly());
        sink.report(Anomaly::transport(
            ChannelKind::Consumption,
            &TransportError::Timeout,
        ));
        assert_eq!(clock.now(), t0);
    }

    #[test]
    fn suppressed_hard_failure_skips_cooldown() {
        let clock = ManualClock::new();
        let policy = LogPolicy {
            verbose_limit: 1,
            cadence: 10,
            cooldown: Duration::from_secs(60),
        };
        let mut sink = LogSink::new(policy, clock.clone());
        let t0 = clock.now();

        sink.report(hard_anomaly()); // logged
        sink.report(hard_anomaly()); // suppressed
        assert_eq!(clock.now() - t0, Duration::from_secs(60));
    }

    #[test]
    fn anomaly_messages() {
        let incomplete = Anomaly::IncompleteScan {
            channel: ChannelKind::Consumption,
            unresolved: 2,
        };
        assert_eq!(incomplete.to_string(), "not all tags found, unread tags: 2");
        assert_eq!(hard_anomaly().channel(), ChannelKind::Production);
        assert!(hard_anomaly().is_hard());
        assert!(!incomplete.is_hard());
    }
}
