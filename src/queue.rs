//! Work queue derivation over the host x credential associations.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;

use crate::config::QUEUE_ACTIVE_DAYS;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::{HostCredential, ScanRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStatus {
    /// Associations created by this refresh.
    pub new: usize,
    /// Pairs never attempted.
    pub pending: usize,
}

/// A pair never attempted belongs to the scan queue.
pub fn is_untested(row: &HostCredential) -> bool {
    row.last_tested.is_none()
}

/// A pair whose last attempt succeeded at least `scan_interval_days` ago is
/// due for re-verification. Negative or unrepresentable intervals are never due.
pub fn is_due_for_rescan(row: &HostCredential, now: DateTime<Utc>) -> bool {
    let Some(tested) = row.last_tested else { return false };
    if row.result.is_empty() || row.credential.scan_interval_days < 0 {
        return false;
    }
    ChronoDuration::try_days(row.credential.scan_interval_days)
        .and_then(|interval| now.checked_sub_signed(interval))
        .is_some_and(|cutoff| tested <= cutoff)
}

/// Group rows into one request per host, keeping first-seen host order and
/// row order within each host.
pub fn group_requests<'a>(rows: impl IntoIterator<Item = &'a HostCredential>) -> Vec<ScanRequest> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut requests: Vec<ScanRequest> = Vec::new();
    for row in rows {
        let slot = *index.entry(row.hostport.as_str()).or_insert_with(|| {
            requests.push(ScanRequest {
                hostport: row.hostport.clone(),
                credentials: Vec::new(),
            });
            requests.len() - 1
        });
        requests[slot].credentials.push(row.credential.clone());
    }
    requests
}

pub fn scan_queue(rows: &[HostCredential]) -> Vec<ScanRequest> {
    group_requests(rows.iter().filter(|row| is_untested(row)))
}

pub fn rescan_queue(rows: &[HostCredential], now: DateTime<Utc>) -> Vec<ScanRequest> {
    group_requests(rows.iter().filter(|row| is_due_for_rescan(row, now)))
}

/// Keeps the association table complete and reads the two queues from it.
pub struct QueueManager<'a, S: Store> {
    store: &'a mut S,
}

impl<'a, S: Store> QueueManager<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Make sure every active host is paired with every credential.
    pub fn refresh(&mut self) -> Result<QueueStatus, StoreError> {
        let new = self.store.ensure_host_credentials(QUEUE_ACTIVE_DAYS)?;
        let pending = self
            .store
            .host_credentials(QUEUE_ACTIVE_DAYS)?
            .iter()
            .filter(|row| is_untested(row))
            .count();
        log::info!("[queue] brute force queue size: new={} total={}", new, pending);
        Ok(QueueStatus { new, pending })
    }

    pub fn scan_queue(&self) -> Result<Vec<ScanRequest>, StoreError> {
        Ok(scan_queue(&self.store.host_credentials(QUEUE_ACTIVE_DAYS)?))
    }

    pub fn rescan_queue(&self) -> Result<Vec<ScanRequest>, StoreError> {
        Ok(rescan_queue(&self.store.host_credentials(QUEUE_ACTIVE_DAYS)?, Utc::now()))
    }
}
