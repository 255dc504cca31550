use futures::stream::StreamExt;
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ProbeError;

/// Servers may send this many lines before the identification string.
const MAX_PRELUDE_LINES: usize = 8;
/// RFC 4253 caps the identification line at 255 bytes.
const MAX_LINE_LEN: usize = 255;

/// An endpoint that answered with an SSH identification string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerResult {
    pub hostport: String,
    pub banner: String,
}

fn ssh_ident() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^SSH-\d+\.\d+-\S+").expect("valid identification regex"))
}

pub fn is_ssh_identification(line: &str) -> bool {
    ssh_ident().is_match(line)
}

/// Connect and read the SSH identification line. The socket is dropped on
/// return, whatever the outcome.
pub async fn fetch_banner(hostport: &str, io_timeout: Duration) -> Result<String, ProbeError> {
    let stream = match timeout(io_timeout, TcpStream::connect(hostport)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(ProbeError::Connection(e.to_string())),
        Err(_) => return Err(ProbeError::Timeout(io_timeout)),
    };

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    for _ in 0..MAX_PRELUDE_LINES {
        line.clear();
        // Line plus CR LF; anything longer is not a valid SSH peer.
        let mut limited = (&mut reader).take(MAX_LINE_LEN as u64 + 2);
        let n = match timeout(io_timeout, limited.read_line(&mut line)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(ProbeError::Connection(e.to_string())),
            Err(_) => return Err(ProbeError::Timeout(io_timeout)),
        };
        if n == 0 {
            return Err(ProbeError::Protocol("connection closed before banner".to_string()));
        }
        if !line.ends_with('\n') && n > MAX_LINE_LEN {
            return Err(ProbeError::Protocol(format!("no newline within {} bytes", MAX_LINE_LEN + 2)));
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if is_ssh_identification(trimmed) {
            return Ok(trimmed.to_string());
        }
    }
    Err(ProbeError::Protocol("not an ssh service".to_string()))
}

/// Banner worker pool. Targets that fail are dropped; only SSH endpoints
/// are forwarded.
pub fn spawn_banner_probes(
    targets: mpsc::Receiver<String>,
    concurrency: usize,
    io_timeout: Duration,
) -> mpsc::Receiver<BannerResult> {
    let concurrency = concurrency.max(1);
    let (tx, rx) = mpsc::channel(concurrency);

    tokio::spawn(async move {
        let mut results = ReceiverStream::new(targets)
            .map(|hostport| async move {
                let start = Instant::now();
                match fetch_banner(&hostport, io_timeout).await {
                    Ok(banner) => Some(BannerResult { hostport, banner }),
                    Err(e) => {
                        log::debug!("[scan::banner] probe_failed: host={} duration={}ms error={}",
                            hostport, start.elapsed().as_millis(), e);
                        None
                    }
                }
            })
            .buffer_unordered(concurrency);

        let mut found = 0usize;
        while let Some(result) = results.next().await {
            let Some(result) = result else { continue };
            log::debug!("[scan::banner] banner: host={} banner={}", result.hostport, result.banner);
            found += 1;
            if tx.send(result).await.is_err() {
                break;
            }
        }
        log::debug!("[scan::banner] pool_finished: ssh_endpoints={}", found);
    });

    rx
}
