use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ProbeError;
use crate::ssh::{HostKey, SshConnector};
use crate::types::{AuthOutcome, Credential};

/// In-memory connector with canned host keys and accepted passwords.
#[derive(Default)]
pub struct ScriptedConnector {
    keys: HashMap<String, HostKey>,
    accepted: HashSet<(String, String, String)>,
    unreachable: HashSet<String>,
    pub attempts: Mutex<Vec<(String, String)>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, hostport: &str, fingerprint: &str, version: Option<&str>) -> Self {
        self.keys.insert(
            hostport.to_string(),
            HostKey {
                fingerprint: fingerprint.to_string(),
                version: version.map(str::to_string),
            },
        );
        self
    }

    pub fn with_password(mut self, hostport: &str, user: &str, password: &str) -> Self {
        self.accepted
            .insert((hostport.to_string(), user.to_string(), password.to_string()));
        self
    }

    pub fn with_unreachable(mut self, hostport: &str) -> Self {
        self.unreachable.insert(hostport.to_string());
        self
    }
}

#[async_trait]
impl SshConnector for ScriptedConnector {
    async fn fingerprint(&self, hostport: &str, timeout: Duration) -> Result<HostKey, ProbeError> {
        self.keys
            .get(hostport)
            .cloned()
            .ok_or(ProbeError::Timeout(timeout))
    }

    async fn authenticate(&self, hostport: &str, credential: &Credential, _timeout: Duration) -> AuthOutcome {
        self.attempts
            .lock()
            .unwrap()
            .push((hostport.to_string(), credential.user.clone()));
        if self.unreachable.contains(hostport) {
            return AuthOutcome::Error("connection refused".to_string());
        }
        let key = (hostport.to_string(), credential.user.clone(), credential.password.clone());
        if self.accepted.contains(&key) {
            AuthOutcome::Success(format!("authenticated: {}", credential.user))
        } else {
            AuthOutcome::Failure
        }
    }
}
