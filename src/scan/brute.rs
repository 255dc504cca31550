use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::BruteMode;
use crate::ssh::SshConnector;
use crate::types::{AuthOutcome, BruteForceResult, ScanRequest};

/// Brute force worker pool.
///
/// Each request is handled by one worker, which tries the request's
/// credentials in order and emits one result per attempt. With
/// `BruteMode::StopAtFirstSuccess` a host's remaining credentials are
/// skipped once one is accepted. Nothing is persisted here.
pub fn spawn_brute_forcer<C: SshConnector>(
    requests: Vec<ScanRequest>,
    connector: Arc<C>,
    concurrency: usize,
    io_timeout: Duration,
    mode: BruteMode,
) -> mpsc::Receiver<BruteForceResult> {
    let concurrency = concurrency.max(1);
    let (tx, rx) = mpsc::channel(concurrency);

    tokio::spawn(async move {
        stream::iter(requests)
            .for_each_concurrent(concurrency, |request| {
                let connector = Arc::clone(&connector);
                let tx = tx.clone();
                async move { attempt_request(request, connector.as_ref(), io_timeout, mode, &tx).await }
            })
            .await;
    });

    rx
}

async fn attempt_request<C: SshConnector>(
    request: ScanRequest,
    connector: &C,
    io_timeout: Duration,
    mode: BruteMode,
    tx: &mpsc::Sender<BruteForceResult>,
) {
    for credential in request.credentials {
        let outcome = connector.authenticate(&request.hostport, &credential, io_timeout).await;
        match &outcome {
            AuthOutcome::Success(_) => log::debug!("[scan::brute] accepted: host={} user={}",
                request.hostport, credential.user),
            AuthOutcome::Failure => log::trace!("[scan::brute] rejected: host={} user={}",
                request.hostport, credential.user),
            AuthOutcome::Error(e) => log::debug!("[scan::brute] attempt_error: host={} user={} error={}",
                request.hostport, credential.user, e),
        }

        let stop = outcome.is_success() && mode == BruteMode::StopAtFirstSuccess;
        let result = BruteForceResult {
            hostport: request.hostport.clone(),
            credential,
            outcome,
            timestamp: Utc::now(),
        };
        if tx.send(result).await.is_err() {
            return;
        }
        if stop {
            break;
        }
    }
}
