pub mod banner;
pub mod brute;
pub mod fingerprint;

#[cfg(test)]
pub(crate) mod testing;

pub use banner::{BannerResult, fetch_banner, spawn_banner_probes};
pub use brute::spawn_brute_forcer;
pub use fingerprint::spawn_fingerprint_probes;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::ScanConfiguration;
use crate::ssh::SshConnector;
use crate::types::DiscoveredHost;

/// Chain the banner and fingerprint pools. Most targets fail fast at the
/// banner stage, so it gets twice the nominal concurrency.
pub fn spawn_discovery_pipeline<C: SshConnector>(
    targets: mpsc::Receiver<String>,
    connector: Arc<C>,
    cfg: &ScanConfiguration,
) -> mpsc::Receiver<DiscoveredHost> {
    let banners = spawn_banner_probes(targets, cfg.concurrency.saturating_mul(2), cfg.timeout);
    spawn_fingerprint_probes(banners, connector, cfg.concurrency, cfg.timeout)
}
