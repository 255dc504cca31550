//! Persistent state: hosts, credentials, the host x credential scan
//! associations and confirmed vulnerabilities.
//!
//! All mutating calls join the currently open transaction, if any. Only one
//! transaction may be open at a time; the auditor is the single committer.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::HashMap;

use crate::error::StoreError;
use crate::types::{BruteForceResult, Credential, DiscoveredHost, Host, HostCredential, Vulnerability};

pub trait Store {
    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Every host ever recorded, keyed by hostport.
    fn known_hosts(&self) -> Result<HashMap<String, Host>, StoreError>;
    /// Hosts seen within the last `days` days.
    fn active_hosts(&self, days: i64) -> Result<Vec<Host>, StoreError>;
    /// Insert a new host, or overwrite fingerprint and version of an existing one.
    fn add_or_update_host(&mut self, host: &DiscoveredHost) -> Result<(), StoreError>;
    /// Record what changed between the stored and the freshly probed host.
    fn add_host_changes(&mut self, host: &DiscoveredHost, previous: &Host) -> Result<(), StoreError>;
    fn set_last_seen(&mut self, hostport: &str) -> Result<(), StoreError>;

    /// Returns true when the credential was added, false when an existing
    /// pair had its interval updated.
    fn add_credential(&mut self, credential: &Credential) -> Result<bool, StoreError>;
    fn credentials(&self) -> Result<Vec<Credential>, StoreError>;
    fn reset_credentials(&mut self) -> Result<(), StoreError>;
    /// Forget when every pair was last tested, sending them all back to the
    /// scan queue.
    fn reset_intervals(&mut self) -> Result<(), StoreError>;

    /// Create missing associations between hosts active within `days` and
    /// every credential. Returns how many were created.
    fn ensure_host_credentials(&mut self, days: i64) -> Result<usize, StoreError>;
    /// Associations for hosts active within `days`, ordered by hostport.
    fn host_credentials(&self, days: i64) -> Result<Vec<HostCredential>, StoreError>;

    fn record_brute_result(&mut self, result: &BruteForceResult) -> Result<(), StoreError>;
    fn vulnerabilities(&self) -> Result<Vec<Vulnerability>, StoreError>;
}
