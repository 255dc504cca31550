use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::{
    BruteMode, DEFAULT_CONCURRENCY, DEFAULT_PORT, DEFAULT_SCAN_INTERVAL_DAYS, DEFAULT_TIMEOUT_MS, ScanConfiguration,
    validate_scan_interval,
};
use crate::credentials::ImportFormat;

#[derive(Parser, Debug)]
#[command(name = "ssh-auditor")]
#[command(about = "Discover SSH servers and audit them for weak credentials")]
pub struct Cli {
    /// Number of concurrent probes
    #[arg(long, global = true, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Path to the audit database
    #[arg(long, global = true, env = "SSH_AUDITOR_DB", default_value = "ssh_db.sqlite")]
    pub db: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover SSH servers and record their host keys
    Discover(DiscoverArgs),
    /// Test untested host/credential pairs
    Scan(ScanArgs),
    /// Re-test pairs that previously succeeded
    Rescan(BruteArgs),
    /// Send log-check requests or report on them
    Logcheck {
        #[command(subcommand)]
        command: LogcheckCommand,
    },
    /// Manage credentials
    Credential {
        #[command(subcommand)]
        command: CredentialCommand,
    },
    /// Show hosts sharing a host key
    Dupes,
    /// Show confirmed vulnerabilities
    Vuln,
    /// Print the full report as JSON
    Report,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct DiscoverArgs {
    #[command(subcommand)]
    pub source: Option<DiscoverSource>,

    /// Networks, addresses or hostnames to scan
    pub include: Vec<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Subcommand, Debug)]
pub enum DiscoverSource {
    /// Read targets from standard input, one per line
    Fromfile(TargetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Ports to probe
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![DEFAULT_PORT])]
    pub ports: Vec<u16>,

    /// Networks or addresses to skip
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Per-connection timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct ScanArgs {
    #[command(subcommand)]
    pub command: Option<ScanCommand>,

    #[command(flatten)]
    pub brute: BruteArgs,
}

#[derive(Subcommand, Debug)]
pub enum ScanCommand {
    /// Send every host/credential pair back to the scan queue
    Reset,
}

#[derive(Args, Debug, Clone)]
pub struct BruteArgs {
    /// Per-connection timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Keep testing a host's credentials after one succeeds
    #[arg(long)]
    pub exhaustive: bool,
}

#[derive(Subcommand, Debug)]
pub enum LogcheckCommand {
    /// Send one synthetic login per active host
    Run {
        /// Per-connection timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout: u64,
    },
    /// Check which log-check requests reached the log system
    Report {
        /// Splunk management URL, e.g. https://splunk:8089/
        #[arg(long, env = "SSH_AUDITOR_SPLUNK")]
        splunk: Url,

        /// HTTP timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum CredentialCommand {
    /// Add or update one credential
    Add {
        user: String,
        password: String,
        /// Days between re-verifications of a successful login
        #[arg(long, default_value_t = DEFAULT_SCAN_INTERVAL_DAYS, value_parser = parse_scan_interval)]
        scan_interval: i64,
    },
    /// List credentials as JSON lines
    List,
    /// Delete every credential
    Reset,
    /// Import credentials from standard input
    Import {
        #[arg(value_enum)]
        format: ImportFormatArg,
        /// Interval for records that do not carry one
        #[arg(long, default_value_t = DEFAULT_SCAN_INTERVAL_DAYS, value_parser = parse_scan_interval)]
        scan_interval: i64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormatArg {
    Tsv,
    Json,
}

impl From<ImportFormatArg> for ImportFormat {
    fn from(arg: ImportFormatArg) -> Self {
        match arg {
            ImportFormatArg::Tsv => ImportFormat::Tsv,
            ImportFormatArg::Json => ImportFormat::Json,
        }
    }
}

impl TargetArgs {
    pub fn scan_configuration(&self, include: Vec<String>, concurrency: usize) -> ScanConfiguration {
        ScanConfiguration::new()
            .with_include(include)
            .with_exclude(self.exclude.clone())
            .with_ports(self.ports.clone())
            .with_concurrency(concurrency)
            .with_timeout(Duration::from_millis(self.timeout))
    }
}

impl BruteArgs {
    pub fn scan_configuration(&self, concurrency: usize) -> ScanConfiguration {
        let mode = if self.exhaustive { BruteMode::Exhaustive } else { BruteMode::StopAtFirstSuccess };
        ScanConfiguration::new()
            .with_concurrency(concurrency)
            .with_timeout(Duration::from_millis(self.timeout))
            .with_brute_mode(mode)
    }
}

fn parse_scan_interval(value: &str) -> Result<i64, String> {
    let days: i64 = value.trim().parse().map_err(|e| format!("{}: {}", value, e))?;
    validate_scan_interval(days)
}

/// Targets from a reader: one per line, blank lines and `#` comments skipped.
pub fn read_targets<R: std::io::BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut targets = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        targets.push(line.to_string());
    }
    Ok(targets)
}

pub fn parse() -> Cli {
    Cli::parse()
}
