use std::time::Duration;

/// Failures that stop an audit run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("store error: {0}")]
    Persistence(#[from] StoreError),
    #[error("log search failed: {0}")]
    ExternalService(#[from] SearchError),
    #[error("invalid input: {0}")]
    Input(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("a transaction is already open")]
    TransactionOpen,
    #[error("no transaction is open")]
    NoTransaction,
    #[error("{0}")]
    Other(String),
}

/// Per-target network or protocol failure. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search backend returned status {0}")]
    Status(u16),
    #[error("could not decode search response: {0}")]
    Decode(String),
}
