//! SSH protocol access for the fingerprint and brute force stages.
//!
//! libssh2 is blocking, so every session runs on tokio's blocking pool with
//! socket and session timeouts bounding each operation. Sessions and sockets
//! are owned by the blocking closure and dropped on every exit path.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use ssh2::{ErrorCode, HashType, KeyboardInteractivePrompt, Prompt, Session};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::ProbeError;
use crate::types::{AuthOutcome, Credential};

/// libssh2's LIBSSH2_ERROR_AUTHENTICATION_FAILED.
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;

/// Host key material learned from an unauthenticated key exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKey {
    pub fingerprint: String,
    /// Identification string the server sent, when libssh2 reports one.
    pub version: Option<String>,
}

#[async_trait]
pub trait SshConnector: Send + Sync + 'static {
    /// Complete the key exchange only and report the host key fingerprint.
    async fn fingerprint(&self, hostport: &str, timeout: Duration) -> Result<HostKey, ProbeError>;

    /// Try one credential over a fresh connection.
    async fn authenticate(&self, hostport: &str, credential: &Credential, timeout: Duration) -> AuthOutcome;
}

/// Production connector backed by the `ssh2` crate.
#[derive(Debug, Clone, Default)]
pub struct Ssh2Connector;

impl Ssh2Connector {
    pub fn new() -> Self {
        Self
    }
}

/// OpenSSH-style `SHA256:<base64>` rendering of a host key hash.
pub fn format_fingerprint(sha256: &[u8]) -> String {
    format!("SHA256:{}", STANDARD_NO_PAD.encode(sha256))
}

fn connect(hostport: &str, timeout: Duration) -> Result<Session, ProbeError> {
    let addr = hostport
        .to_socket_addrs()
        .map_err(|e| ProbeError::Connection(format!("{}: {}", hostport, e)))?
        .next()
        .ok_or_else(|| ProbeError::Connection(format!("{}: no address", hostport)))?;

    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| match e.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => ProbeError::Timeout(timeout),
        _ => ProbeError::Connection(e.to_string()),
    })?;
    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));

    let mut session = Session::new().map_err(|e| ProbeError::Protocol(e.to_string()))?;
    session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
    session.set_tcp_stream(stream);
    session.handshake().map_err(|e| classify_session_error(&e, timeout))?;
    Ok(session)
}

fn classify_session_error(err: &ssh2::Error, timeout: Duration) -> ProbeError {
    // LIBSSH2_ERROR_TIMEOUT
    if matches!(err.code(), ErrorCode::Session(-9)) {
        ProbeError::Timeout(timeout)
    } else {
        ProbeError::Protocol(err.to_string())
    }
}

fn close(session: &Session) {
    let _ = session.disconnect(None, "ssh-auditor", None);
}

fn fingerprint_blocking(hostport: &str, timeout: Duration) -> Result<HostKey, ProbeError> {
    let session = connect(hostport, timeout)?;
    let fingerprint = session
        .host_key_hash(HashType::Sha256)
        .map(format_fingerprint)
        .ok_or_else(|| ProbeError::Protocol("server presented no host key".to_string()));
    let version = session.banner().map(|b| b.trim().to_string());
    close(&session);
    Ok(HostKey { fingerprint: fingerprint?, version })
}

/// Answers every keyboard-interactive prompt with the password under test.
struct PasswordPrompt<'a>(&'a str);

impl KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt<'b>(&mut self, _username: &str, _instructions: &str, prompts: &[Prompt<'b>]) -> Vec<String> {
        prompts.iter().map(|_| self.0.to_string()).collect()
    }
}

fn classify_auth(result: Result<(), ssh2::Error>, session: &Session, timeout: Duration) -> AuthOutcome {
    match result {
        Ok(()) if session.authenticated() => AuthOutcome::Success(success_text(session)),
        Ok(()) => AuthOutcome::Failure,
        Err(e) if matches!(e.code(), ErrorCode::Session(LIBSSH2_ERROR_AUTHENTICATION_FAILED)) => {
            AuthOutcome::Failure
        }
        Err(e) => AuthOutcome::Error(classify_session_error(&e, timeout).to_string()),
    }
}

fn success_text(session: &Session) -> String {
    match session.banner() {
        Some(banner) if !banner.trim().is_empty() => format!("authenticated: {}", banner.trim()),
        _ => "authenticated".to_string(),
    }
}

fn authenticate_blocking(hostport: &str, credential: &Credential, timeout: Duration) -> AuthOutcome {
    let session = match connect(hostport, timeout) {
        Ok(session) => session,
        Err(e) => return AuthOutcome::Error(e.to_string()),
    };

    let outcome = match session.auth_methods(&credential.user) {
        // The server let us in with the "none" method.
        Ok(_) if session.authenticated() => AuthOutcome::Success(success_text(&session)),
        Ok(methods) => {
            let methods: Vec<&str> = methods.split(',').collect();
            if methods.contains(&"password") {
                let result = session.userauth_password(&credential.user, &credential.password);
                classify_auth(result, &session, timeout)
            } else if methods.contains(&"keyboard-interactive") {
                let mut prompt = PasswordPrompt(&credential.password);
                let result = session.userauth_keyboard_interactive(&credential.user, &mut prompt);
                classify_auth(result, &session, timeout)
            } else {
                // Key-only servers can never accept a password.
                AuthOutcome::Failure
            }
        }
        Err(e) => AuthOutcome::Error(classify_session_error(&e, timeout).to_string()),
    };
    close(&session);
    outcome
}

#[async_trait]
impl SshConnector for Ssh2Connector {
    async fn fingerprint(&self, hostport: &str, timeout: Duration) -> Result<HostKey, ProbeError> {
        let hostport = hostport.to_string();
        tokio::task::spawn_blocking(move || fingerprint_blocking(&hostport, timeout))
            .await
            .map_err(|e| ProbeError::Protocol(format!("probe task failed: {}", e)))?
    }

    async fn authenticate(&self, hostport: &str, credential: &Credential, timeout: Duration) -> AuthOutcome {
        let hostport = hostport.to_string();
        let credential = credential.clone();
        match tokio::task::spawn_blocking(move || authenticate_blocking(&hostport, &credential, timeout)).await {
            Ok(outcome) => outcome,
            Err(e) => AuthOutcome::Error(format!("auth task failed: {}", e)),
        }
    }
}
