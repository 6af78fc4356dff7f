use std::time::Duration;

/// Timing of one scheduler cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Wall-clock budget for collecting one channel's required tags.
    pub scan_timeout: Duration,
    /// How long lines are discarded after a mode switch.
    pub flush_duration: Duration,
    /// Pause after both channels have been scanned.
    pub cycle_interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(5),
            flush_duration: Duration::from_secs(1),
            cycle_interval: Duration::from_secs(3),
        }
    }
}

/// Controls how repeated anomalies are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPolicy {
    /// Consecutive anomalies logged unconditionally.
    pub verbose_limit: u64,
    /// Past the verbose limit, only every `cadence`-th anomaly is logged.
    pub cadence: u64,
    /// Pause after logging a hard device failure.
    pub cooldown: Duration,
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            verbose_limit: 5,
            cadence: 50,
            cooldown: Duration::from_secs(60),
        }
    }
}
