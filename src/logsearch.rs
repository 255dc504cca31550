use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use crate::error::SearchError;

const SPLUNK_EXPORT_PATH: &str = "services/search/jobs/export";
const SPLUNK_SEARCH: &str = r#"search "logcheck-" earliest=-14d | rex "logcheck-(?<logcheck_ip>[0-9a-fA-F:.]+)" | stats count by logcheck_ip"#;

/// Returns the IP addresses the external log system saw log-check probes for.
#[async_trait]
pub trait LogSearcher: Send + Sync {
    async fn get_ips(&self) -> Result<HashSet<String>, SearchError>;
}

/// Backend selection for the log-check report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBackend {
    Splunk {
        base_url: Url,
        username: Option<String>,
        password: Option<String>,
    },
}

pub fn build_searcher(backend: LogBackend, timeout: Duration) -> Result<Box<dyn LogSearcher>, SearchError> {
    match backend {
        LogBackend::Splunk { base_url, username, password } => {
            let mut searcher = SplunkLogSearcher::new(base_url, timeout)?;
            if let Some(username) = username {
                searcher = searcher.with_basic_auth(username, password);
            }
            Ok(Box::new(searcher))
        }
    }
}

fn logcheck_ip() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"logcheck-([0-9a-fA-F:.]+)").expect("valid logcheck regex"))
}

/// Splunk export API searcher.
#[derive(Debug, Clone)]
pub struct SplunkLogSearcher {
    client: Client,
    base_url: Url,
    auth: Option<(String, Option<String>)>,
}

#[derive(Debug, Deserialize)]
struct ExportLine {
    #[serde(default)]
    result: Option<HashMap<String, serde_json::Value>>,
}

impl SplunkLogSearcher {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("ssh-auditor/0.1")
            .build()?;
        Ok(Self { client, base_url, auth: None })
    }

    pub fn with_basic_auth(mut self, username: String, password: Option<String>) -> Self {
        self.auth = Some((username, password));
        self
    }

    fn export_url(&self) -> Result<Url, SearchError> {
        self.base_url
            .join(SPLUNK_EXPORT_PATH)
            .map_err(|e| SearchError::Decode(format!("bad splunk url: {}", e)))
    }
}

/// Pull IPs out of Splunk's line-delimited JSON export output.
pub fn parse_export(body: &str) -> Result<HashSet<String>, SearchError> {
    let mut ips = HashSet::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed: ExportLine =
            serde_json::from_str(line).map_err(|e| SearchError::Decode(e.to_string()))?;
        let Some(result) = parsed.result else { continue };

        if let Some(ip) = result.get("logcheck_ip").and_then(|v| v.as_str()) {
            ips.insert(ip.to_string());
            continue;
        }
        if let Some(raw) = result.get("_raw").and_then(|v| v.as_str()) {
            for cap in logcheck_ip().captures_iter(raw) {
                ips.insert(cap[1].trim_end_matches('.').to_string());
            }
        }
    }
    Ok(ips)
}

#[async_trait]
impl LogSearcher for SplunkLogSearcher {
    async fn get_ips(&self) -> Result<HashSet<String>, SearchError> {
        let url = self.export_url()?;
        log::debug!("[logsearch] splunk_export: url={}", url);

        let mut request = self
            .client
            .post(url)
            .form(&[("search", SPLUNK_SEARCH), ("output_mode", "json")]);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let ips = parse_export(&body)?;
        log::info!("[logsearch] splunk_results: ips={}", ips.len());
        Ok(ips)
    }
}
