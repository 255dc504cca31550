use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::target::split_host;
use crate::types::{Host, Vulnerability};

/// Fingerprint -> every active host presenting it (groups of 2 or more).
pub type DuplicateKeys = BTreeMap<String, Vec<Host>>;

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub active_hosts: Vec<Host>,
    pub active_hosts_count: usize,
    pub duplicate_keys: DuplicateKeys,
    pub duplicate_keys_count: usize,
    pub vulnerabilities: Vec<Vulnerability>,
    pub vulnerabilities_count: usize,
}

impl AuditReport {
    pub fn new(active_hosts: Vec<Host>, duplicate_keys: DuplicateKeys, vulnerabilities: Vec<Vulnerability>) -> Self {
        Self {
            active_hosts_count: active_hosts.len(),
            duplicate_keys_count: duplicate_keys.len(),
            vulnerabilities_count: vulnerabilities.len(),
            active_hosts,
            duplicate_keys,
            vulnerabilities,
        }
    }
}

/// Group hosts by fingerprint and keep only shared ones. Hosts whose key is
/// unknown are not grouped.
pub fn duplicate_keys(hosts: Vec<Host>) -> DuplicateKeys {
    let mut groups: DuplicateKeys = BTreeMap::new();
    for host in hosts.into_iter().filter(|h| !h.fingerprint.is_empty()) {
        groups.entry(host.fingerprint.clone()).or_default().push(host);
    }
    groups.retain(|_, hosts| hosts.len() >= 2);
    groups
}

/// Whether a host's log-check probe reached the log system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogcheckEntry {
    pub hostport: String,
    pub ip: String,
    pub logged: bool,
}

pub fn logcheck_coverage(hosts: &[Host], found_ips: &HashSet<String>) -> Vec<LogcheckEntry> {
    hosts
        .iter()
        .filter_map(|host| {
            let Some(ip) = split_host(&host.hostport) else {
                log::error!("[report] invalid hostport: host={}", host.hostport);
                return None;
            };
            Some(LogcheckEntry {
                hostport: host.hostport.clone(),
                ip: ip.to_string(),
                logged: found_ips.contains(ip),
            })
        })
        .collect()
}
