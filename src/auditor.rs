use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::batch::{MAX_BATCH_LATENCY, MAX_BATCH_SIZE, batch};
use crate::config::{BruteMode, LOGCHECK_ACTIVE_DAYS, REPORT_ACTIVE_DAYS, ScanConfiguration};
use crate::error::{AuditError, StoreError};
use crate::logsearch::LogSearcher;
use crate::queue::{QueueManager, QueueStatus};
use crate::report::{AuditReport, DuplicateKeys, LogcheckEntry, duplicate_keys, logcheck_coverage};
use crate::scan::{spawn_brute_forcer, spawn_discovery_pipeline};
use crate::ssh::{Ssh2Connector, SshConnector};
use crate::store::Store;
use crate::target::{expand_scan_configuration, split_host};
use crate::types::{
    AuditResult, AuthOutcome, BruteForceResult, Credential, DiscoveredHost, DiscoveryReport, Host, ScanRequest,
    Vulnerability,
};

const LOGCHECK_PASSWORD: &str = "logcheck";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Scan,
    Rescan,
}

/// Runs the audit pipelines against one store.
///
/// The auditor owns the store and is the only code that opens
/// transactions: workers hand results back over channels and every batch
/// is committed here, one transaction at a time.
pub struct Auditor<S: Store, C: SshConnector = Ssh2Connector> {
    store: S,
    connector: Arc<C>,
}

impl<S: Store> Auditor<S, Ssh2Connector> {
    pub fn new(store: S) -> Self {
        Self::with_connector(store, Arc::new(Ssh2Connector::new()))
    }
}

impl<S: Store, C: SshConnector> Auditor<S, C> {
    pub fn with_connector(store: S, connector: Arc<C>) -> Self {
        Self { store, connector }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Enumerate, probe and record hosts, then refresh the scan queues.
    pub async fn discover(&mut self, cfg: &ScanConfiguration) -> Result<(DiscoveryReport, QueueStatus), AuditError> {
        let targets = expand_scan_configuration(cfg).await?;
        let hosts = spawn_discovery_pipeline(targets, Arc::clone(&self.connector), cfg);
        let report = self.update_store_from_discovery(hosts).await?;
        let queue = self.update_queues()?;
        Ok((report, queue))
    }

    /// Merge a stream of probed hosts into the store, one transaction per
    /// batch. A failed batch is rolled back and ends the run; earlier
    /// batches stay committed.
    pub async fn update_store_from_discovery(
        &mut self,
        hosts: mpsc::Receiver<DiscoveredHost>,
    ) -> Result<DiscoveryReport, AuditError> {
        let known = self.store.known_hosts()?;
        log::info!("[auditor] current known hosts: count={}", known.len());

        let mut report = DiscoveryReport::default();
        let mut batches = batch(hosts, MAX_BATCH_SIZE, MAX_BATCH_LATENCY);
        while let Some(host_batch) = batches.recv().await {
            self.store.begin()?;
            let applied = reconcile_batch(&mut self.store, &known, host_batch, &mut report)
                .and_then(|()| self.store.commit());
            if let Err(e) = applied {
                let _ = self.store.rollback();
                log::error!("[auditor] discovery batch failed: error={}", e);
                return Err(e.into());
            }
        }

        log::info!("[auditor] discovery report: total={} new={} updated={}",
            report.total, report.new, report.updated);
        Ok(report)
    }

    pub fn update_queues(&mut self) -> Result<QueueStatus, AuditError> {
        Ok(QueueManager::new(&mut self.store).refresh()?)
    }

    pub async fn scan(&mut self, cfg: &ScanConfiguration) -> Result<AuditResult, AuditError> {
        self.brute(QueueKind::Scan, cfg).await
    }

    pub async fn rescan(&mut self, cfg: &ScanConfiguration) -> Result<AuditResult, AuditError> {
        self.brute(QueueKind::Rescan, cfg).await
    }

    async fn brute(&mut self, kind: QueueKind, cfg: &ScanConfiguration) -> Result<AuditResult, AuditError> {
        self.update_queues()?;
        let queue = {
            let manager = QueueManager::new(&mut self.store);
            match kind {
                QueueKind::Scan => manager.scan_queue()?,
                QueueKind::Rescan => manager.rescan_queue()?,
            }
        };
        log::info!("[auditor] brute force starting: queue={:?} hosts={} attempts={}",
            kind, queue.len(), queue.iter().map(|r| r.credentials.len()).sum::<usize>());

        let results = spawn_brute_forcer(
            queue,
            Arc::clone(&self.connector),
            cfg.concurrency,
            cfg.timeout,
            cfg.brute_mode,
        );
        self.commit_brute_results(results).await
    }

    /// Persist brute force results in batches, one transaction each.
    pub async fn commit_brute_results(
        &mut self,
        results: mpsc::Receiver<BruteForceResult>,
    ) -> Result<AuditResult, AuditError> {
        let mut summary = AuditResult::default();
        let mut batches = batch(results, MAX_BATCH_SIZE, MAX_BATCH_LATENCY);
        while let Some(result_batch) = batches.recv().await {
            self.store.begin()?;
            let applied = record_batch(&mut self.store, &result_batch, &mut summary)
                .and_then(|()| self.store.commit());
            if let Err(e) = applied {
                let _ = self.store.rollback();
                log::error!("[auditor] brute force batch failed: error={}", e);
                return Err(e.into());
            }
        }

        log::info!("[auditor] brute force scan report: total={} pos={} neg={} err={}",
            summary.total, summary.success, summary.failure, summary.error);
        Ok(summary)
    }

    /// One intentionally invalid credential per host active in the log-check
    /// window, user derived from the host's address.
    pub fn logcheck_queue(&self) -> Result<Vec<ScanRequest>, AuditError> {
        let hosts = self.store.active_hosts(LOGCHECK_ACTIVE_DAYS)?;
        let requests = hosts
            .iter()
            .filter_map(|host| {
                let Some(ip) = split_host(&host.hostport) else {
                    log::warn!("[auditor] bad hostport: host={}", host.hostport);
                    return None;
                };
                Some(ScanRequest {
                    hostport: host.hostport.clone(),
                    credentials: vec![Credential::new(format!("logcheck-{}", ip), LOGCHECK_PASSWORD, 0)],
                })
            })
            .collect();
        Ok(requests)
    }

    /// Send the synthetic log-check authentication attempts. Nothing is
    /// persisted; returns the hostports that were reached.
    pub async fn logcheck(&self, cfg: &ScanConfiguration) -> Result<Vec<String>, AuditError> {
        let requests = self.logcheck_queue()?;
        let mut results = spawn_brute_forcer(
            requests,
            Arc::clone(&self.connector),
            cfg.concurrency,
            cfg.timeout,
            BruteMode::StopAtFirstSuccess,
        );

        let mut sent = Vec::new();
        while let Some(result) = results.recv().await {
            match &result.outcome {
                AuthOutcome::Error(e) => {
                    log::error!("[auditor] failed to send logcheck auth request: host={} user={} error={}",
                        result.hostport, result.credential.user, e);
                }
                _ => {
                    log::info!("[auditor] sent logcheck auth request: host={} user={}",
                        result.hostport, result.credential.user);
                    sent.push(result.hostport);
                }
            }
        }
        sent.sort();
        Ok(sent)
    }

    pub fn dupes(&self) -> Result<DuplicateKeys, AuditError> {
        let hosts = self.store.active_hosts(REPORT_ACTIVE_DAYS)?;
        Ok(duplicate_keys(hosts))
    }

    pub fn vulnerabilities(&self) -> Result<Vec<Vulnerability>, AuditError> {
        Ok(self.store.vulnerabilities()?)
    }

    pub fn get_report(&self) -> Result<AuditReport, AuditError> {
        let hosts = self.store.active_hosts(REPORT_ACTIVE_DAYS)?;
        let dupes = self.dupes()?;
        let vulns = self.vulnerabilities()?;
        Ok(AuditReport::new(hosts, dupes, vulns))
    }

    /// Cross-reference active hosts with the IPs the log system saw.
    pub async fn logcheck_report(&self, searcher: &dyn LogSearcher) -> Result<Vec<LogcheckEntry>, AuditError> {
        let hosts = self.store.active_hosts(LOGCHECK_ACTIVE_DAYS)?;
        let found = searcher.get_ips().await?;
        log::info!("[auditor] found active hosts in store: count={}", hosts.len());
        log::info!("[auditor] found related hosts in logs: count={}", found.len());
        Ok(logcheck_coverage(&hosts, &found))
    }
}

fn reconcile_batch<S: Store>(
    store: &mut S,
    known: &HashMap<String, Host>,
    hosts: Vec<DiscoveredHost>,
    report: &mut DiscoveryReport,
) -> Result<(), StoreError> {
    for mut host in hosts {
        report.total += 1;
        let Some(previous) = known.get(&host.hostport) else {
            store.add_or_update_host(&host)?;
            log::info!("[auditor] discovered new host: host={} version={} fp={}",
                host.hostport, host.version, host.fingerprint);
            report.new += 1;
            continue;
        };

        // An empty probe field means unknown, not changed.
        if host.fingerprint.is_empty() {
            host.fingerprint = previous.fingerprint.clone();
        }
        if host.version.is_empty() {
            host.version = previous.version.clone();
        }

        if host.fingerprint != previous.fingerprint || host.version != previous.version {
            store.add_host_changes(&host, previous)?;
            store.add_or_update_host(&host)?;
            log::info!("[auditor] discovered changed host: host={} version={} fp={} old_version={} old_fp={}",
                host.hostport, host.version, host.fingerprint, previous.version, previous.fingerprint);
            report.updated += 1;
        } else {
            store.set_last_seen(&host.hostport)?;
        }
    }
    Ok(())
}

fn record_batch<S: Store>(
    store: &mut S,
    results: &[BruteForceResult],
    summary: &mut AuditResult,
) -> Result<(), StoreError> {
    for result in results {
        let cred = &result.credential;
        match &result.outcome {
            AuthOutcome::Success(text) => log::info!(
                "[auditor] positive brute force result: host={} user={} password={} result={}",
                result.hostport, cred.user, cred.password, text),
            AuthOutcome::Failure => log::debug!(
                "[auditor] negative brute force result: host={} user={} password={}",
                result.hostport, cred.user, cred.password),
            AuthOutcome::Error(e) => log::warn!(
                "[auditor] brute force error: host={} user={} password={} error={}",
                result.hostport, cred.user, cred.password, e),
        }
        store.record_brute_result(result)?;
        summary.record(&result.outcome);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::testing::ScriptedConnector;
    use crate::store::SqliteStore;
    use crate::types::HostChange;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn discovered(hostport: &str, fp: &str, version: &str) -> DiscoveredHost {
        DiscoveredHost {
            hostport: hostport.to_string(),
            fingerprint: fp.to_string(),
            version: version.to_string(),
        }
    }

    fn feed(hosts: Vec<DiscoveredHost>) -> mpsc::Receiver<DiscoveredHost> {
        let (tx, rx) = mpsc::channel(hosts.len().max(1));
        tokio::spawn(async move {
            for h in hosts {
                let _ = tx.send(h).await;
            }
        });
        rx
    }

    fn auditor_with(connector: ScriptedConnector) -> Auditor<SqliteStore, ScriptedConnector> {
        Auditor::with_connector(SqliteStore::open_in_memory().unwrap(), Arc::new(connector))
    }

    fn fast_config() -> ScanConfiguration {
        ScanConfiguration::new()
            .with_concurrency(8)
            .with_timeout(Duration::from_millis(300))
    }

    /// Delegates to an in-memory store, failing the nth host write.
    struct FailingStore {
        inner: SqliteStore,
        host_writes: usize,
        fail_at: usize,
    }

    impl Store for FailingStore {
        fn begin(&mut self) -> Result<(), StoreError> { self.inner.begin() }
        fn commit(&mut self) -> Result<(), StoreError> { self.inner.commit() }
        fn rollback(&mut self) -> Result<(), StoreError> { self.inner.rollback() }
        fn known_hosts(&self) -> Result<HashMap<String, Host>, StoreError> { self.inner.known_hosts() }
        fn active_hosts(&self, days: i64) -> Result<Vec<Host>, StoreError> { self.inner.active_hosts(days) }
        fn add_or_update_host(&mut self, host: &DiscoveredHost) -> Result<(), StoreError> {
            self.host_writes += 1;
            if self.host_writes == self.fail_at {
                return Err(StoreError::Other("disk full".to_string()));
            }
            self.inner.add_or_update_host(host)
        }
        fn add_host_changes(&mut self, host: &DiscoveredHost, previous: &Host) -> Result<(), StoreError> {
            self.inner.add_host_changes(host, previous)
        }
        fn set_last_seen(&mut self, hostport: &str) -> Result<(), StoreError> { self.inner.set_last_seen(hostport) }
        fn add_credential(&mut self, c: &Credential) -> Result<bool, StoreError> { self.inner.add_credential(c) }
        fn credentials(&self) -> Result<Vec<Credential>, StoreError> { self.inner.credentials() }
        fn reset_credentials(&mut self) -> Result<(), StoreError> { self.inner.reset_credentials() }
        fn reset_intervals(&mut self) -> Result<(), StoreError> { self.inner.reset_intervals() }
        fn ensure_host_credentials(&mut self, days: i64) -> Result<usize, StoreError> {
            self.inner.ensure_host_credentials(days)
        }
        fn host_credentials(&self, days: i64) -> Result<Vec<crate::types::HostCredential>, StoreError> {
            self.inner.host_credentials(days)
        }
        fn record_brute_result(&mut self, r: &BruteForceResult) -> Result<(), StoreError> {
            self.inner.record_brute_result(r)
        }
        fn vulnerabilities(&self) -> Result<Vec<Vulnerability>, StoreError> { self.inner.vulnerabilities() }
    }

    #[tokio::test]
    async fn test_reconcile_new_changed_and_unchanged() {
        let mut auditor = auditor_with(ScriptedConnector::new());
        let first = auditor
            .update_store_from_discovery(feed(vec![
                discovered("10.0.0.1:22", "F1", "SSH-2.0-A"),
                discovered("10.0.0.2:22", "F9", "SSH-2.0-A"),
            ]))
            .await
            .unwrap();
        assert_eq!(first, DiscoveryReport { total: 2, new: 2, updated: 0 });

        // Host 1 changes key, host 2 is re-seen with an unknown fingerprint.
        let second = auditor
            .update_store_from_discovery(feed(vec![
                discovered("10.0.0.1:22", "F2", "SSH-2.0-A"),
                discovered("10.0.0.2:22", "", "SSH-2.0-A"),
            ]))
            .await
            .unwrap();
        assert_eq!(second, DiscoveryReport { total: 2, new: 0, updated: 1 });

        let known = auditor.store().known_hosts().unwrap();
        assert_eq!(known["10.0.0.1:22"].fingerprint, "F2");
        assert_eq!(known["10.0.0.2:22"].fingerprint, "F9");

        let changes: Vec<HostChange> = auditor.store().host_changes("10.0.0.1:22").unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!((changes[0].old_value.as_str(), changes[0].new_value.as_str()), ("F1", "F2"));
        assert!(auditor.store().host_changes("10.0.0.2:22").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_committed_batches() {
        let store = FailingStore {
            inner: SqliteStore::open_in_memory().unwrap(),
            host_writes: 0,
            fail_at: 75,
        };
        let mut auditor = Auditor::with_connector(store, Arc::new(ScriptedConnector::new()));

        let hosts: Vec<DiscoveredHost> = (0..120)
            .map(|i| discovered(&format!("10.0.{}.{}:22", i / 200, i % 200), &format!("F{}", i), "SSH-2.0-A"))
            .collect();
        let (tx, rx) = mpsc::channel(256);
        for h in hosts {
            tx.send(h).await.unwrap();
        }
        drop(tx);

        let err = auditor.update_store_from_discovery(rx).await.unwrap_err();
        assert!(matches!(err, AuditError::Persistence(StoreError::Other(_))));

        // The first full batch of 50 survived, the failed second batch did not.
        let store = auditor.into_store();
        assert_eq!(store.inner.known_hosts().unwrap().len(), 50);
        // And the store is usable again afterwards.
        let mut inner = store.inner;
        inner.begin().unwrap();
        inner.commit().unwrap();
    }

    #[tokio::test]
    async fn test_scan_then_rescan_flow() {
        let connector = ScriptedConnector::new()
            .with_password("10.0.0.1:22", "root", "root123")
            .with_unreachable("10.0.0.3:22");
        let mut auditor = auditor_with(connector);
        auditor
            .store_mut()
            .add_credential(&Credential::new("root", "root123", 7))
            .unwrap();
        auditor
            .store_mut()
            .add_credential(&Credential::new("admin", "admin", 7))
            .unwrap();
        auditor
            .update_store_from_discovery(feed(vec![
                discovered("10.0.0.1:22", "F1", "v"),
                discovered("10.0.0.2:22", "F2", "v"),
                discovered("10.0.0.3:22", "F3", "v"),
            ]))
            .await
            .unwrap();

        let result = auditor.scan(&fast_config()).await.unwrap();
        // Host 1: admin rejected then root accepted. Host 2: both rejected.
        // Host 3: both attempts errored.
        assert_eq!(result, AuditResult { total: 6, success: 1, failure: 3, error: 2 });

        let vulns = auditor.vulnerabilities().unwrap();
        assert_eq!(vulns.len(), 1);
        assert_eq!((vulns[0].hostport.as_str(), vulns[0].user.as_str()), ("10.0.0.1:22", "root"));

        // Errors are retried by the next scan; nothing is due for rescan yet.
        let retry = auditor.scan(&fast_config()).await.unwrap();
        assert_eq!(retry.total, 2);
        assert_eq!(retry.error, 2);
        assert_eq!(auditor.rescan(&fast_config()).await.unwrap().total, 0);

        // Pretend the success is 10 days old: now it is due.
        auditor
            .store_mut()
            .record_brute_result(&BruteForceResult {
                hostport: "10.0.0.1:22".to_string(),
                credential: Credential::new("root", "root123", 7),
                outcome: AuthOutcome::Success("ok".to_string()),
                timestamp: Utc::now() - ChronoDuration::days(10),
            })
            .unwrap();
        let rescan = auditor.rescan(&fast_config()).await.unwrap();
        assert_eq!(rescan, AuditResult { total: 1, success: 1, failure: 0, error: 0 });
    }

    #[tokio::test]
    async fn test_dupes_and_report() {
        let mut auditor = auditor_with(ScriptedConnector::new());
        auditor
            .update_store_from_discovery(feed(vec![
                discovered("h1:22", "F1", "v"),
                discovered("h2:22", "F1", "v"),
                discovered("h3:22", "F1", "v"),
                discovered("h4:22", "F2", "v"),
                discovered("h5:22", "F2", "v"),
            ]))
            .await
            .unwrap();
        // h5 falls out of the two day window.
        auditor
            .store_mut()
            .set_host_last_seen("h5:22", Utc::now() - ChronoDuration::days(3))
            .unwrap();

        let dupes = auditor.dupes().unwrap();
        assert_eq!(dupes.keys().collect::<Vec<_>>(), vec!["F1"]);
        let group: Vec<&str> = dupes["F1"].iter().map(|h| h.hostport.as_str()).collect();
        assert_eq!(group, vec!["h1:22", "h2:22", "h3:22"]);

        let report = auditor.get_report().unwrap();
        assert_eq!(report.active_hosts_count, 4);
        assert_eq!(report.duplicate_keys_count, 1);
        assert_eq!(report.vulnerabilities_count, 0);
    }

    #[tokio::test]
    async fn test_logcheck_uses_synthetic_credentials_and_persists_nothing() {
        let connector = ScriptedConnector::new().with_unreachable("10.0.0.2:22");
        let mut auditor = auditor_with(connector);
        auditor
            .update_store_from_discovery(feed(vec![
                discovered("10.0.0.1:22", "F1", "v"),
                discovered("10.0.0.2:22", "F2", "v"),
            ]))
            .await
            .unwrap();

        let queue = auditor.logcheck_queue().unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].credentials, vec![Credential::new("logcheck-10.0.0.1", "logcheck", 0)]);

        let sent = auditor.logcheck(&fast_config()).await.unwrap();
        assert_eq!(sent, vec!["10.0.0.1:22".to_string()]);
        assert!(auditor.vulnerabilities().unwrap().is_empty());
        assert!(auditor.store().credentials().unwrap().is_empty());
    }

    struct FixedSearcher(Result<Vec<&'static str>, u16>);

    #[async_trait]
    impl LogSearcher for FixedSearcher {
        async fn get_ips(&self) -> Result<HashSet<String>, crate::error::SearchError> {
            match &self.0 {
                Ok(ips) => Ok(ips.iter().map(|s| s.to_string()).collect()),
                Err(code) => Err(crate::error::SearchError::Status(*code)),
            }
        }
    }

    #[tokio::test]
    async fn test_logcheck_report() {
        let mut auditor = auditor_with(ScriptedConnector::new());
        auditor
            .update_store_from_discovery(feed(vec![
                discovered("10.0.0.1:22", "F1", "v"),
                discovered("10.0.0.2:22", "F2", "v"),
            ]))
            .await
            .unwrap();

        let entries = auditor.logcheck_report(&FixedSearcher(Ok(vec!["10.0.0.2"]))).await.unwrap();
        let logged: Vec<(&str, bool)> = entries.iter().map(|e| (e.hostport.as_str(), e.logged)).collect();
        assert_eq!(logged, vec![("10.0.0.1:22", false), ("10.0.0.2:22", true)]);

        let err = auditor.logcheck_report(&FixedSearcher(Err(503))).await.unwrap_err();
        assert!(matches!(err, AuditError::ExternalService(_)));
    }

    async fn ssh_banner_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let _ = sock.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await;
                    tokio::time::sleep(Duration::from_millis(100)).await;
                });
            }
        });
        port
    }

    #[tokio::test]
    async fn test_discover_end_to_end() {
        let p1 = ssh_banner_server().await;
        let p2 = ssh_banner_server().await;
        let closed = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };

        let connector = ScriptedConnector::new()
            .with_key(&format!("127.0.0.1:{}", p1), "SHA256:shared", None)
            .with_key(&format!("127.0.0.1:{}", p2), "SHA256:shared", None);
        let mut auditor = auditor_with(connector);
        auditor
            .store_mut()
            .add_credential(&Credential::new("root", "root", 7))
            .unwrap();

        let cfg = fast_config()
            .with_include(vec!["127.0.0.1".to_string()])
            .with_ports(vec![p1, p2, closed]);
        let (report, queue) = auditor.discover(&cfg).await.unwrap();
        assert_eq!(report, DiscoveryReport { total: 2, new: 2, updated: 0 });
        assert_eq!(queue, QueueStatus { new: 2, pending: 2 });

        let known = auditor.store().known_hosts().unwrap();
        assert_eq!(known[&format!("127.0.0.1:{}", p1)].version, "SSH-2.0-OpenSSH_9.6");
        assert_eq!(auditor.dupes().unwrap()["SHA256:shared"].len(), 2);

        // Discovery also refreshed the queue.
        assert_eq!(auditor.store().host_credentials(14).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_discover_rejects_bad_target_before_work() {
        let mut auditor = auditor_with(ScriptedConnector::new());
        let cfg = fast_config().with_include(vec!["10.0.0.0/99".to_string()]);
        let err = auditor.discover(&cfg).await.unwrap_err();
        assert!(matches!(err, AuditError::Configuration(_)));
        assert!(auditor.store().known_hosts().unwrap().is_empty());
    }
}
