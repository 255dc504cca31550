use ipnetwork::IpNetwork;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use tokio::net::lookup_host;
use tokio::sync::mpsc;

use crate::config::ScanConfiguration;
use crate::error::AuditError;

/// Largest IPv4 network a single include entry may expand to (/8, 16M hosts).
const MIN_IPV4_PREFIX: u8 = 8;
/// Same bound for IPv6 (/104, 16M hosts).
const MIN_IPV6_PREFIX: u8 = 104;

const HOSTPORT_QUEUE_SIZE: usize = 1024;

/// One parsed include entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSpec {
    Network(IpNetwork),
    Address(IpAddr),
    Hostname(String),
}

impl TargetSpec {
    pub fn parse(input: &str) -> Result<Self, AuditError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AuditError::Configuration("empty target".to_string()));
        }

        if let Ok(ip) = input.parse::<IpAddr>() {
            return Ok(TargetSpec::Address(ip));
        }

        if input.contains('/') {
            let network: IpNetwork = input
                .parse()
                .map_err(|e| AuditError::Configuration(format!("{}: {}", input, e)))?;
            check_prefix(input, &network)?;
            return Ok(TargetSpec::Network(network));
        }

        if is_hostname(input) {
            return Ok(TargetSpec::Hostname(input.to_string()));
        }

        Err(AuditError::Configuration(format!(
            "{}: not a host, address or network",
            input
        )))
    }

    async fn expand(&self) -> Result<Vec<IpAddr>, AuditError> {
        match self {
            TargetSpec::Address(ip) => Ok(vec![*ip]),
            TargetSpec::Network(network) => Ok(network.iter().collect()),
            TargetSpec::Hostname(name) => resolve(name).await,
        }
    }
}

fn check_prefix(input: &str, network: &IpNetwork) -> Result<(), AuditError> {
    let (min_prefix, family) = match network {
        IpNetwork::V4(_) => (MIN_IPV4_PREFIX, "IPv4"),
        IpNetwork::V6(_) => (MIN_IPV6_PREFIX, "IPv6"),
    };
    if network.prefix() < min_prefix {
        return Err(AuditError::Configuration(format!(
            "{}: /{} is too large for {} (minimum prefix: /{})",
            input,
            network.prefix(),
            family,
            min_prefix
        )));
    }
    Ok(())
}

fn is_hostname(input: &str) -> bool {
    input.len() <= 253
        && input.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

async fn resolve(name: &str) -> Result<Vec<IpAddr>, AuditError> {
    let addrs = lookup_host((name, 0))
        .await
        .map_err(|e| AuditError::Configuration(format!("{}: resolution failed: {}", name, e)))?;
    let ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
    if ips.is_empty() {
        return Err(AuditError::Configuration(format!(
            "{}: no addresses found",
            name
        )));
    }
    log::debug!("[target] resolved: host={} addresses={}", name, ips.len());
    Ok(ips)
}

/// Parse exclude entries; each must be a network or a bare address.
pub fn parse_excludes(exclude: &[String]) -> Result<Vec<IpNetwork>, AuditError> {
    exclude
        .iter()
        .map(|entry| {
            entry
                .trim()
                .parse::<IpNetwork>()
                .map_err(|e| AuditError::Configuration(format!("exclude {}: {}", entry, e)))
        })
        .collect()
}

/// Expand include entries into a de-duplicated address list, in include
/// order, with every address inside an exclude network removed.
pub async fn enumerate_hosts(include: &[String], exclude: &[String]) -> Result<Vec<IpAddr>, AuditError> {
    // Parse everything up front so a bad entry fails before any DNS work.
    let specs = include
        .iter()
        .map(|entry| TargetSpec::parse(entry))
        .collect::<Result<Vec<_>, _>>()?;
    let excludes = parse_excludes(exclude)?;

    let mut seen = HashSet::new();
    let mut hosts = Vec::new();
    for spec in &specs {
        for ip in spec.expand().await? {
            if excludes.iter().any(|net| net.contains(ip)) {
                continue;
            }
            if seen.insert(ip) {
                hosts.push(ip);
            }
        }
    }
    Ok(hosts)
}

/// Cross hosts with ports, ports as the outer loop so that repeated
/// contacts with one host are spread out over a large scan. Strings are
/// built as the iterator is consumed.
pub fn hostports<'a>(hosts: &'a [IpAddr], ports: &'a [u16]) -> impl Iterator<Item = String> + 'a {
    unique_ports(ports)
        .into_iter()
        .flat_map(move |port| hosts.iter().map(move |ip| join_host_port(*ip, port)))
}

fn unique_ports(ports: &[u16]) -> Vec<u16> {
    let mut seen = HashSet::new();
    ports.iter().copied().filter(|port| seen.insert(*port)).collect()
}

pub fn join_host_port(ip: IpAddr, port: u16) -> String {
    SocketAddr::new(ip, port).to_string()
}

/// Split `host:port` (or `[v6]:port`) into its host part.
pub fn split_host(hostport: &str) -> Option<&str> {
    let (host, port) = hostport.rsplit_once(':')?;
    port.parse::<u16>().ok()?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() { None } else { Some(host) }
}

/// Enumerate the configured targets and feed them into a bounded queue.
pub async fn expand_scan_configuration(cfg: &ScanConfiguration) -> Result<mpsc::Receiver<String>, AuditError> {
    let hosts = enumerate_hosts(&cfg.include, &cfg.exclude).await?;
    let ports = unique_ports(&cfg.ports);
    log::info!(
        "[target] discovering hosts: include={} exclude={} total={} ports={}",
        cfg.include.join(","),
        cfg.exclude.join(","),
        hosts.len(),
        ports.iter().map(u16::to_string).collect::<Vec<_>>().join(",")
    );

    let (tx, rx) = mpsc::channel(HOSTPORT_QUEUE_SIZE);
    tokio::spawn(async move {
        for hostport in hostports(&hosts, &ports) {
            if tx.send(hostport).await.is_err() {
                break;
            }
        }
    });
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_target_specs() {
        assert!(matches!(TargetSpec::parse("10.0.0.1").unwrap(), TargetSpec::Address(_)));
        assert!(matches!(TargetSpec::parse("10.0.0.0/30").unwrap(), TargetSpec::Network(_)));
        assert!(matches!(TargetSpec::parse("2001:db8::1").unwrap(), TargetSpec::Address(_)));
        assert!(matches!(
            TargetSpec::parse("bastion.example.org").unwrap(),
            TargetSpec::Hostname(_)
        ));
    }

    #[test]
    fn test_parse_invalid_specs() {
        for bad in ["", "10.0.0.0/33", "not a host", "10.0.0.0/4", "host_name!"] {
            assert!(
                matches!(TargetSpec::parse(bad), Err(AuditError::Configuration(_))),
                "expected configuration error for {:?}",
                bad
            );
        }
        assert!(parse_excludes(&strings(&["bogus"])).is_err());
    }

    #[tokio::test]
    async fn test_enumerate_excludes_and_dedupes() {
        let hosts = enumerate_hosts(
            &strings(&["10.0.0.0/30", "10.0.0.1", "10.0.0.8"]),
            &strings(&["10.0.0.2/32"]),
        )
        .await
        .unwrap();

        let expected: Vec<IpAddr> = [0, 1, 3, 8]
            .iter()
            .map(|last| IpAddr::V4(Ipv4Addr::new(10, 0, 0, *last)))
            .collect();
        assert_eq!(hosts, expected);
    }

    #[tokio::test]
    async fn test_enumerate_exclude_everything() {
        let hosts = enumerate_hosts(&strings(&["192.168.1.0/28"]), &strings(&["192.168.0.0/16"]))
            .await
            .unwrap();
        assert!(hosts.is_empty());
    }

    #[tokio::test]
    async fn test_enumerate_rejects_bad_exclude() {
        let err = enumerate_hosts(&strings(&["10.0.0.1"]), &strings(&["10.0.0.0/40"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Configuration(_)));
    }

    #[test]
    fn test_hostports_ports_outer_loop() {
        let hosts = vec![
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        ];
        assert_eq!(
            hostports(&hosts, &[22, 2222, 22]).collect::<Vec<_>>(),
            strings(&["10.0.0.1:22", "10.0.0.2:22", "10.0.0.1:2222", "10.0.0.2:2222"])
        );
    }

    #[test]
    fn test_every_pair_exactly_once() {
        let hosts: Vec<IpAddr> = (1..=20).map(|i| IpAddr::V4(Ipv4Addr::new(10, 1, 0, i))).collect();
        let ports = [22, 2200, 2222];
        let out: Vec<String> = hostports(&hosts, &ports).collect();
        assert_eq!(out.len(), hosts.len() * ports.len());
        let unique: HashSet<&String> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
    }

    #[test]
    fn test_split_host() {
        assert_eq!(split_host("10.0.0.1:22"), Some("10.0.0.1"));
        assert_eq!(split_host("[2001:db8::1]:2222"), Some("2001:db8::1"));
        assert_eq!(split_host("host.example.org:22"), Some("host.example.org"));
        assert_eq!(split_host("10.0.0.1"), None);
        assert_eq!(split_host(":22"), None);
        assert_eq!(
            join_host_port("2001:db8::1".parse().unwrap(), 22),
            "[2001:db8::1]:22"
        );
    }

    #[tokio::test]
    async fn test_expand_scan_configuration_streams_targets() {
        let cfg = ScanConfiguration::new()
            .with_include(strings(&["127.0.0.1", "127.0.0.2"]))
            .with_ports(vec![22, 2222]);
        let mut rx = expand_scan_configuration(&cfg).await.unwrap();
        let mut out = Vec::new();
        while let Some(hp) = rx.recv().await {
            out.push(hp);
        }
        assert_eq!(
            out,
            strings(&["127.0.0.1:22", "127.0.0.2:22", "127.0.0.1:2222", "127.0.0.2:2222"])
        );
    }

    #[test]
    fn test_hostports_is_lazy() {
        let network: IpNetwork = "10.0.0.0/8".parse().unwrap();
        let hosts: Vec<IpAddr> = network.iter().take(1 << 16).collect();
        let mut iter = hostports(&hosts, &[22, 2222]);
        assert_eq!(iter.next().as_deref(), Some("10.0.0.0:22"));
        assert_eq!(iter.nth(1 << 16).as_deref(), Some("10.0.0.1:2222"));
    }

    #[tokio::test]
    async fn test_expand_scan_configuration_stops_when_receiver_drops() {
        let cfg = ScanConfiguration::new()
            .with_include(strings(&["10.20.0.0/16"]))
            .with_ports(vec![22, 2222]);
        let mut rx = expand_scan_configuration(&cfg).await.unwrap();
        let first: Vec<String> = [rx.recv().await.unwrap(), rx.recv().await.unwrap()].into();
        assert_eq!(first, strings(&["10.20.0.0:22", "10.20.0.1:22"]));
        drop(rx);
    }
}
