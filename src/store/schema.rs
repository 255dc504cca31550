use crate::error::StoreError;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS hosts (
    hostport     TEXT PRIMARY KEY,
    fingerprint  TEXT NOT NULL DEFAULT '',
    version      TEXT NOT NULL DEFAULT '',
    first_seen   INTEGER NOT NULL,
    last_seen    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hosts_last_seen ON hosts(last_seen);

-- One row per changed field per rediscovery
CREATE TABLE IF NOT EXISTS host_changes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    hostport   TEXT NOT NULL REFERENCES hosts(hostport) ON DELETE CASCADE,
    field      TEXT NOT NULL,
    old_value  TEXT NOT NULL,
    new_value  TEXT NOT NULL,
    changed_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS credentials (
    user           TEXT NOT NULL,
    password       TEXT NOT NULL,
    scan_interval  INTEGER NOT NULL,
    PRIMARY KEY (user, password)
);

-- Host x credential scan associations
CREATE TABLE IF NOT EXISTS host_creds (
    hostport     TEXT NOT NULL REFERENCES hosts(hostport) ON DELETE CASCADE,
    user         TEXT NOT NULL,
    password     TEXT NOT NULL,
    last_tested  INTEGER,
    result       TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (hostport, user, password),
    FOREIGN KEY (user, password) REFERENCES credentials(user, password) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS vulnerabilities (
    hostport    TEXT NOT NULL REFERENCES hosts(hostport) ON DELETE CASCADE,
    user        TEXT NOT NULL,
    password    TEXT NOT NULL,
    result      TEXT NOT NULL,
    first_seen  INTEGER NOT NULL,
    last_seen   INTEGER NOT NULL,
    PRIMARY KEY (hostport, user, password)
);
"#;

pub fn initialize(conn: &rusqlite::Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
