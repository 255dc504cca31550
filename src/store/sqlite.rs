use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::Path;

use super::{Store, schema};
use crate::error::StoreError;
use crate::types::{
    AuthOutcome, BruteForceResult, Credential, DiscoveredHost, Host, HostChange, HostCredential, Vulnerability,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn active_cutoff(days: i64) -> i64 {
    Utc::now().timestamp() - days * SECONDS_PER_DAY
}

fn host_from_row(row: &Row<'_>) -> rusqlite::Result<Host> {
    Ok(Host {
        hostport: row.get(0)?,
        fingerprint: row.get(1)?,
        version: row.get(2)?,
        first_seen: to_datetime(row.get(3)?),
        last_seen: to_datetime(row.get(4)?),
    })
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Other(format!("failed to create db directory {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        log::debug!("[store] opened: path={}", path.display());
        Ok(Self { conn, in_transaction: false })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn, in_transaction: false })
    }

    /// Change history for one host, oldest first.
    pub fn host_changes(&self, hostport: &str) -> Result<Vec<HostChange>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT hostport, field, old_value, new_value, changed_at FROM host_changes \
             WHERE hostport = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![hostport], |row| {
            Ok(HostChange {
                hostport: row.get(0)?,
                field: row.get(1)?,
                old_value: row.get(2)?,
                new_value: row.get(3)?,
                changed_at: to_datetime(row.get(4)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Overwrite a host's last-seen time.
    pub fn set_host_last_seen(&mut self, hostport: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE hosts SET last_seen = ?1 WHERE hostport = ?2",
            params![at.timestamp(), hostport],
        )?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::TransactionOpen);
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.in_transaction = false;
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            let _ = self.conn.execute_batch("ROLLBACK");
            return Err(e.into());
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.in_transaction = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn known_hosts(&self) -> Result<HashMap<String, Host>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT hostport, fingerprint, version, first_seen, last_seen FROM hosts")?;
        let rows = stmt.query_map([], host_from_row)?;
        let mut hosts = HashMap::new();
        for host in rows {
            let host = host?;
            hosts.insert(host.hostport.clone(), host);
        }
        Ok(hosts)
    }

    fn active_hosts(&self, days: i64) -> Result<Vec<Host>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT hostport, fingerprint, version, first_seen, last_seen FROM hosts \
             WHERE last_seen >= ?1 ORDER BY hostport",
        )?;
        let rows = stmt.query_map(params![active_cutoff(days)], host_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn add_or_update_host(&mut self, host: &DiscoveredHost) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO hosts (hostport, fingerprint, version, first_seen, last_seen) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT(hostport) DO UPDATE SET \
                fingerprint = excluded.fingerprint, \
                version = excluded.version, \
                last_seen = excluded.last_seen",
            params![host.hostport, host.fingerprint, host.version, now],
        )?;
        Ok(())
    }

    fn add_host_changes(&mut self, host: &DiscoveredHost, previous: &Host) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let fields = [
            ("fingerprint", &previous.fingerprint, &host.fingerprint),
            ("version", &previous.version, &host.version),
        ];
        for (field, old, new) in fields {
            if old == new {
                continue;
            }
            self.conn.execute(
                "INSERT INTO host_changes (hostport, field, old_value, new_value, changed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![host.hostport, field, old, new, now],
            )?;
        }
        Ok(())
    }

    fn set_last_seen(&mut self, hostport: &str) -> Result<(), StoreError> {
        self.set_host_last_seen(hostport, Utc::now())
    }

    fn add_credential(&mut self, credential: &Credential) -> Result<bool, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT scan_interval FROM credentials WHERE user = ?1 AND password = ?2",
                params![credential.user, credential.password],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(_) => {
                self.conn.execute(
                    "UPDATE credentials SET scan_interval = ?3 WHERE user = ?1 AND password = ?2",
                    params![credential.user, credential.password, credential.scan_interval_days],
                )?;
                Ok(false)
            }
            None => {
                self.conn.execute(
                    "INSERT INTO credentials (user, password, scan_interval) VALUES (?1, ?2, ?3)",
                    params![credential.user, credential.password, credential.scan_interval_days],
                )?;
                Ok(true)
            }
        }
    }

    fn credentials(&self) -> Result<Vec<Credential>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user, password, scan_interval FROM credentials ORDER BY user, password")?;
        let rows = stmt.query_map([], |row| {
            Ok(Credential {
                user: row.get(0)?,
                password: row.get(1)?,
                scan_interval_days: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn reset_credentials(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM host_creds", [])?;
        self.conn.execute("DELETE FROM credentials", [])?;
        Ok(())
    }

    fn reset_intervals(&mut self) -> Result<(), StoreError> {
        let n = self
            .conn
            .execute("UPDATE host_creds SET last_tested = NULL, result = ''", [])?;
        log::debug!("[store] reset_intervals: rows={}", n);
        Ok(())
    }

    fn ensure_host_credentials(&mut self, days: i64) -> Result<usize, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO host_creds (hostport, user, password) \
             SELECT h.hostport, c.user, c.password FROM hosts h CROSS JOIN credentials c \
             WHERE h.last_seen >= ?1",
            params![active_cutoff(days)],
        )?;
        Ok(inserted)
    }

    fn host_credentials(&self, days: i64) -> Result<Vec<HostCredential>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT hc.hostport, c.user, c.password, c.scan_interval, hc.last_tested, hc.result \
             FROM host_creds hc \
             JOIN credentials c ON c.user = hc.user AND c.password = hc.password \
             JOIN hosts h ON h.hostport = hc.hostport \
             WHERE h.last_seen >= ?1 \
             ORDER BY hc.hostport, c.user, c.password",
        )?;
        let rows = stmt.query_map(params![active_cutoff(days)], |row| {
            let last_tested: Option<i64> = row.get(4)?;
            Ok(HostCredential {
                hostport: row.get(0)?,
                credential: Credential {
                    user: row.get(1)?,
                    password: row.get(2)?,
                    scan_interval_days: row.get(3)?,
                },
                last_tested: last_tested.map(to_datetime),
                result: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn record_brute_result(&mut self, result: &BruteForceResult) -> Result<(), StoreError> {
        let ts = result.timestamp.timestamp();
        let cred = &result.credential;
        match &result.outcome {
            AuthOutcome::Success(text) => {
                self.conn.execute(
                    "UPDATE host_creds SET last_tested = ?4, result = ?5 \
                     WHERE hostport = ?1 AND user = ?2 AND password = ?3",
                    params![result.hostport, cred.user, cred.password, ts, text],
                )?;
                self.conn.execute(
                    "INSERT INTO vulnerabilities (hostport, user, password, result, first_seen, last_seen) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
                     ON CONFLICT(hostport, user, password) DO UPDATE SET \
                        result = excluded.result, last_seen = excluded.last_seen",
                    params![result.hostport, cred.user, cred.password, text, ts],
                )?;
            }
            AuthOutcome::Failure => {
                self.conn.execute(
                    "UPDATE host_creds SET last_tested = ?4, result = '' \
                     WHERE hostport = ?1 AND user = ?2 AND password = ?3",
                    params![result.hostport, cred.user, cred.password, ts],
                )?;
                self.conn.execute(
                    "DELETE FROM vulnerabilities WHERE hostport = ?1 AND user = ?2 AND password = ?3",
                    params![result.hostport, cred.user, cred.password],
                )?;
            }
            // Left untouched so the pair is retried on the next run.
            AuthOutcome::Error(_) => {}
        }
        Ok(())
    }

    fn vulnerabilities(&self) -> Result<Vec<Vulnerability>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT hostport, user, password, result, first_seen, last_seen FROM vulnerabilities \
             ORDER BY hostport, user, password",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Vulnerability {
                hostport: row.get(0)?,
                user: row.get(1)?,
                password: row.get(2)?,
                result: row.get(3)?,
                first_seen: to_datetime(row.get(4)?),
                last_seen: to_datetime(row.get(5)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
