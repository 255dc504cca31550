use crate::queue::QueueStatus;
use crate::report::{DuplicateKeys, LogcheckEntry};
use crate::types::{AuditResult, Credential, DiscoveryReport, Vulnerability};

const SEPARATOR_WIDTH: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn separator() -> String {
    "─".repeat(SEPARATOR_WIDTH)
}

pub fn format_discovery_report(report: &DiscoveryReport, queue: Option<&QueueStatus>) -> String {
    let mut out = format!(
        "discovered {} hosts: {} new, {} changed",
        report.total, report.new, report.updated
    );
    if let Some(queue) = queue {
        out.push_str(&format!("\nscan queue: {} new pairs, {} pending", queue.new, queue.pending));
    }
    out
}

pub fn format_audit_result(result: &AuditResult) -> String {
    format!(
        "attempts: {} (success: {}, failure: {}, error: {})",
        result.total, result.success, result.failure, result.error
    )
}

pub fn format_dupes(dupes: &DuplicateKeys) -> String {
    let mut lines = Vec::new();
    for (fingerprint, hosts) in dupes {
        lines.push(format!("{} shared by {} hosts:", fingerprint, hosts.len()));
        for host in hosts {
            lines.push(format!(
                "  {} {} (last seen {})",
                host.hostport,
                host.version,
                host.last_seen.format(TIMESTAMP_FORMAT)
            ));
        }
    }
    lines.join("\n")
}

pub fn format_vulnerabilities(vulns: &[Vulnerability]) -> String {
    if vulns.is_empty() {
        return "no vulnerabilities".to_string();
    }
    let mut lines = vec![format!("{:<24} {:<16} {:<16} {}", "HOST", "USER", "PASSWORD", "LAST SEEN")];
    lines.push(separator());
    for vuln in vulns {
        lines.push(format!(
            "{:<24} {:<16} {:<16} {}",
            vuln.hostport,
            vuln.user,
            vuln.password,
            vuln.last_seen.format(TIMESTAMP_FORMAT)
        ));
    }
    lines.join("\n")
}

/// One `hostport logged` line per entry.
pub fn format_logcheck(entries: &[LogcheckEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{} {}", e.hostport, e.logged))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_credentials(credentials: &[Credential]) -> Result<(), serde_json::Error> {
    for credential in credentials {
        println!("{}", serde_json::to_string(credential)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Host;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    #[test]
    fn test_format_logcheck_lines() {
        let entries = vec![
            LogcheckEntry { hostport: "10.0.0.1:22".into(), ip: "10.0.0.1".into(), logged: true },
            LogcheckEntry { hostport: "10.0.0.2:22".into(), ip: "10.0.0.2".into(), logged: false },
        ];
        assert_eq!(format_logcheck(&entries), "10.0.0.1:22 true\n10.0.0.2:22 false");
    }

    #[test]
    fn test_format_dupes() {
        let seen = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let host = |hp: &str| Host {
            hostport: hp.to_string(),
            fingerprint: "SHA256:abc".to_string(),
            version: "SSH-2.0-OpenSSH_9.6".to_string(),
            first_seen: seen,
            last_seen: seen,
        };
        let mut dupes = BTreeMap::new();
        dupes.insert("SHA256:abc".to_string(), vec![host("h1:22"), host("h2:22")]);
        let text = format_dupes(&dupes);
        assert!(text.starts_with("SHA256:abc shared by 2 hosts:"));
        assert!(text.contains("  h2:22 SSH-2.0-OpenSSH_9.6 (last seen 2024-03-01 12:00:00)"));
    }

    #[test]
    fn test_format_summaries() {
        let report = DiscoveryReport { total: 5, new: 2, updated: 1 };
        assert_eq!(format_discovery_report(&report, None), "discovered 5 hosts: 2 new, 1 changed");
        let queue = QueueStatus { new: 6, pending: 9 };
        assert_eq!(
            format_discovery_report(&report, Some(&queue)),
            "discovered 5 hosts: 2 new, 1 changed\nscan queue: 6 new pairs, 9 pending"
        );
        let result = AuditResult { total: 4, success: 1, failure: 2, error: 1 };
        assert_eq!(format_audit_result(&result), "attempts: 4 (success: 1, failure: 2, error: 1)");
        assert_eq!(format_vulnerabilities(&[]), "no vulnerabilities");
    }
}
