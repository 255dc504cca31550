use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 256;
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_SCAN_INTERVAL_DAYS: i64 = 14;
/// Longest accepted re-verification interval (ten years).
pub const MAX_SCAN_INTERVAL_DAYS: i64 = 3650;

/// Window for duplicate key and vulnerability reporting.
pub const REPORT_ACTIVE_DAYS: i64 = 2;
/// Window for log-check probes, their report and queue maintenance.
pub const LOGCHECK_ACTIVE_DAYS: i64 = 14;
pub const QUEUE_ACTIVE_DAYS: i64 = 14;

/// Whether a host's remaining credentials are tried after one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BruteMode {
    #[default]
    StopAtFirstSuccess,
    Exhaustive,
}

#[derive(Debug, Clone)]
pub struct ScanConfiguration {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub ports: Vec<u16>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub brute_mode: BruteMode,
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanConfiguration {
    pub fn new() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            ports: vec![DEFAULT_PORT],
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            brute_mode: BruteMode::default(),
        }
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        // A zero-sized pool would never make progress.
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_brute_mode(mut self, mode: BruteMode) -> Self {
        self.brute_mode = mode;
        self
    }
}

/// Check a credential's re-verification interval. Zero is allowed here and
/// means "use the default" wherever a default applies.
pub fn validate_scan_interval(days: i64) -> Result<i64, String> {
    if !(0..=MAX_SCAN_INTERVAL_DAYS).contains(&days) {
        return Err(format!(
            "scan interval {} out of range (0..={} days)",
            days, MAX_SCAN_INTERVAL_DAYS
        ));
    }
    Ok(days)
}
