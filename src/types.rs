use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A known SSH endpoint as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    pub hostport: String,
    pub fingerprint: String,
    pub version: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// A freshly probed host, as produced by the fingerprint stage.
///
/// Empty fields mean "unknown" and never overwrite a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub hostport: String,
    pub fingerprint: String,
    pub version: String,
}

/// One field of a host that changed between sightings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostChange {
    pub hostport: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_at: DateTime<Utc>,
}

/// A user/password pair with its re-verification policy.
///
/// The serde names match the line-delimited JSON exchange format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "ScanInterval", default)]
    pub scan_interval_days: i64,
}

impl Credential {
    pub fn new(user: impl Into<String>, password: impl Into<String>, scan_interval_days: i64) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            scan_interval_days,
        }
    }
}

/// One row of the host x credential cross product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCredential {
    pub hostport: String,
    pub credential: Credential,
    pub last_tested: Option<DateTime<Utc>>,
    /// Non-empty only while the pair's last recorded attempt succeeded.
    pub result: String,
}

/// All credentials due against one host, attempted over one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub hostport: String,
    pub credentials: Vec<Credential>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The server accepted the credential; carries the opaque result text.
    Success(String),
    /// The server explicitly rejected the credential.
    Failure,
    /// Anything else: timeout, reset, protocol violation.
    Error(String),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthOutcome::Success(_) => "success",
            AuthOutcome::Failure => "failure",
            AuthOutcome::Error(_) => "error",
        }
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Success(result) => write!(f, "success ({})", result),
            AuthOutcome::Failure => write!(f, "failure"),
            AuthOutcome::Error(detail) => write!(f, "error ({})", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BruteForceResult {
    pub hostport: String,
    pub credential: Credential,
    pub outcome: AuthOutcome,
    pub timestamp: DateTime<Utc>,
}

/// A host where a credential was confirmed to work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vulnerability {
    pub hostport: String,
    pub user: String,
    pub password: String,
    pub result: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Counts from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub total: usize,
    pub new: usize,
    pub updated: usize,
}

/// Counts from one brute force run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditResult {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub error: usize,
}

impl AuditResult {
    pub fn record(&mut self, outcome: &AuthOutcome) {
        self.total += 1;
        match outcome {
            AuthOutcome::Success(_) => self.success += 1,
            AuthOutcome::Failure => self.failure += 1,
            AuthOutcome::Error(_) => self.error += 1,
        }
    }
}
