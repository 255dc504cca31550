pub mod auditor;
pub mod batch;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod logsearch;
pub mod pretty;
pub mod queue;
pub mod report;
pub mod scan;
pub mod ssh;
pub mod store;
pub mod target;
pub mod types;

// Re-export key types and functions at the crate root
pub use auditor::Auditor;
pub use config::{BruteMode, ScanConfiguration};
pub use error::{AuditError, ProbeError, SearchError, StoreError};
pub use logging::init_logging;
pub use logsearch::{LogBackend, LogSearcher};
pub use ssh::{Ssh2Connector, SshConnector};
pub use store::{SqliteStore, Store};
pub use types::{AuditResult, AuthOutcome, Credential, DiscoveryReport, Host, Vulnerability};
