use futures::stream::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::scan::banner::BannerResult;
use crate::ssh::SshConnector;
use crate::types::DiscoveredHost;

/// Fingerprint worker pool. Runs the key exchange against every endpoint
/// that produced a banner and forwards a discovered host record. Endpoints
/// whose key exchange fails are dropped.
pub fn spawn_fingerprint_probes<C: SshConnector>(
    banners: mpsc::Receiver<BannerResult>,
    connector: Arc<C>,
    concurrency: usize,
    io_timeout: Duration,
) -> mpsc::Receiver<DiscoveredHost> {
    let concurrency = concurrency.max(1);
    let (tx, rx) = mpsc::channel(concurrency);

    tokio::spawn(async move {
        let mut hosts = ReceiverStream::new(banners)
            .map(|found| {
                let connector = Arc::clone(&connector);
                async move {
                    match connector.fingerprint(&found.hostport, io_timeout).await {
                        Ok(key) => Some(DiscoveredHost {
                            version: key.version.filter(|v| !v.is_empty()).unwrap_or(found.banner),
                            fingerprint: key.fingerprint,
                            hostport: found.hostport,
                        }),
                        Err(e) => {
                            log::debug!("[scan::fingerprint] key_exchange_failed: host={} error={}",
                                found.hostport, e);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(concurrency);

        while let Some(host) = hosts.next().await {
            let Some(host) = host else { continue };
            log::trace!("[scan::fingerprint] host_key: host={} fp={} version={}",
                host.hostport, host.fingerprint, host.version);
            if tx.send(host).await.is_err() {
                break;
            }
        }
    });

    rx
}
