//! Credential import formats.
//!
//! TSV: `user<TAB>password[<TAB>scanIntervalDays]` per line.
//! JSON: one `{"User":..,"Password":..,"ScanInterval":..}` object per line.
//! A missing or zero interval takes the caller's default.

use std::io::BufRead;

use crate::config::validate_scan_interval;
use crate::error::AuditError;
use crate::store::Store;
use crate::types::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Tsv,
    Json,
}

/// Outcome of parsing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Credential(Credential),
    Skipped { line: usize, reason: String },
}

pub fn parse_tsv_line(line: &str, default_interval: i64) -> Result<Option<Credential>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split('\t').collect();
    let interval = match fields.as_slice() {
        [_, _] => default_interval,
        [_, _, interval] => interval
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid scan interval {:?}: {}", interval, e))?,
        _ => return Err(format!("expected 2 or 3 fields, found {}", fields.len())),
    };
    let interval = validate_scan_interval(interval)?;
    let interval = if interval == 0 { default_interval } else { interval };
    Ok(Some(Credential::new(fields[0], fields[1], interval)))
}

pub fn parse_json_line(line: &str, default_interval: i64) -> Result<Option<Credential>, String> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let mut cred: Credential = serde_json::from_str(line).map_err(|e| e.to_string())?;
    validate_scan_interval(cred.scan_interval_days)?;
    if cred.scan_interval_days == 0 {
        cred.scan_interval_days = default_interval;
    }
    Ok(Some(cred))
}

/// Parse every line of `reader`; malformed lines are reported, not fatal.
pub fn parse_credentials<R: BufRead>(
    reader: R,
    format: ImportFormat,
    default_interval: i64,
) -> Result<Vec<ParsedLine>, AuditError> {
    let mut parsed = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AuditError::Input(format!("reading credentials: {}", e)))?;
        let result = match format {
            ImportFormat::Tsv => parse_tsv_line(&line, default_interval),
            ImportFormat::Json => parse_json_line(&line, default_interval),
        };
        match result {
            Ok(Some(cred)) => parsed.push(ParsedLine::Credential(cred)),
            Ok(None) => {}
            Err(reason) => parsed.push(ParsedLine::Skipped { line: idx + 1, reason }),
        }
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Add or update one credential, logging which happened. Intervals outside
/// `1..=MAX_SCAN_INTERVAL_DAYS` are rejected.
pub fn add_credential<S: Store>(store: &mut S, cred: &Credential) -> Result<bool, AuditError> {
    if cred.scan_interval_days == 0 {
        return Err(AuditError::Input("scan interval must be at least 1 day".to_string()));
    }
    validate_scan_interval(cred.scan_interval_days).map_err(AuditError::Input)?;
    let added = store.add_credential(cred)?;
    let action = if added { "added" } else { "updated" };
    log::info!("[credentials] {} credential: user={} password={} interval={}",
        action, cred.user, cred.password, cred.scan_interval_days);
    Ok(added)
}

/// Import credentials from `reader` in a single transaction.
pub fn import_credentials<S: Store, R: BufRead>(
    store: &mut S,
    reader: R,
    format: ImportFormat,
    default_interval: i64,
) -> Result<ImportSummary, AuditError> {
    let lines = parse_credentials(reader, format, default_interval)?;
    let mut summary = ImportSummary::default();

    store.begin()?;
    for line in &lines {
        match line {
            ParsedLine::Credential(cred) => match add_credential(store, cred) {
                Ok(true) => summary.added += 1,
                Ok(false) => summary.updated += 1,
                Err(e) => {
                    let _ = store.rollback();
                    return Err(e);
                }
            },
            ParsedLine::Skipped { line, reason } => {
                log::error!("[credentials] invalid record: line={} reason={}", line, reason);
                summary.skipped += 1;
            }
        }
    }
    store.commit()?;
    Ok(summary)
}
