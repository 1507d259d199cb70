//! In-process SSH backend using the russh crate
//!
//! Registered as `paramiko`: the full-featured SSH transport and the
//! default when a hostspec names a host without a connection. Unlike
//! the `ssh` shim it keeps one authenticated session per instance,
//! established lazily on the first command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{ChannelMsg, Disconnect, client};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use crate::error::ExecError;
use crate::options::BackendOptions;
use crate::quote;
use crate::result::CommandResult;
use crate::traits::Backend;

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Accept all server keys (like StrictHostKeyChecking=no)
        Ok(true)
    }
}

/// In-process SSH backend
pub struct ParamikoBackend {
    /// Verbatim authority from the hostspec
    host: String,
    user: String,
    hostname: String,
    port: u16,
    identity: Option<PathBuf>,
    options: BackendOptions,
    run_timeout: Option<Duration>,
    /// SSH session, established on first use
    session: Mutex<Option<client::Handle<SshClientHandler>>>,
}

impl std::fmt::Debug for ParamikoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamikoBackend")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Split a `[user@]host[:port]` authority.
///
/// The authority arrives verbatim from the hostspec; decomposing it is
/// this transport's job.
fn split_authority(authority: &str) -> (Option<String>, String, u16) {
    let (user, rest) = match authority.split_once('@') {
        Some((user, rest)) => (Some(user.to_string()), rest),
        None => (None, authority),
    };
    match rest.rsplit_once(':') {
        Some((hostname, port)) => match port.parse::<u16>() {
            Ok(port) => (user, hostname.to_string(), port),
            Err(_) => (user, rest.to_string(), 22),
        },
        None => (user, rest.to_string(), 22),
    }
}

impl ParamikoBackend {
    /// Create a backend for `host`, validating options up front.
    ///
    /// No connection is made here; that happens on the first `run`.
    pub fn new(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        let (user, hostname, port) = split_authority(host);
        if hostname.is_empty() {
            return Err(ExecError::Config(format!(
                "unusable ssh authority '{host}'"
            )));
        }
        let user = user
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string());

        Ok(Self {
            host: host.to_string(),
            user,
            hostname,
            port,
            identity: options.ssh_identity_file.clone(),
            options: options.clone(),
            run_timeout,
            session: Mutex::new(None),
        })
    }

    /// Connect and authenticate, once per instance
    #[instrument(skip(self), fields(host = %self.hostname))]
    async fn connect(&self) -> Result<(), ExecError> {
        let mut session_lock = self.session.lock().await;

        if session_lock.is_some() {
            return Ok(());
        }

        info!(
            host = %self.hostname,
            port = self.port,
            user = %self.user,
            "connecting to SSH"
        );

        let config = Arc::new(client::Config::default());
        let handler = SshClientHandler;

        let mut session = client::connect(config, (&self.hostname[..], self.port), handler)
            .await
            .map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        let identity = self.identity.as_ref().ok_or_else(|| {
            ExecError::AuthenticationFailed(
                "no ssh_identity_file given and agent authentication is not supported"
                    .to_string(),
            )
        })?;

        let key_pair = load_secret_key(identity, None)
            .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?;

        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        let auth_res = session
            .authenticate_publickey(
                &self.user,
                PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg),
            )
            .await
            .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?;

        if !auth_res.success() {
            return Err(ExecError::AuthenticationFailed(
                "public key authentication failed".to_string(),
            ));
        }

        info!(host = %self.hostname, "SSH connected and authenticated");

        *session_lock = Some(session);
        Ok(())
    }

    /// Execute one command over an exec channel
    #[instrument(skip(self, command), fields(host = %self.hostname))]
    async fn execute_remote(&self, command: &str) -> Result<CommandResult, ExecError> {
        let mut session_lock = self.session.lock().await;
        let session = session_lock
            .as_mut()
            .ok_or_else(|| ExecError::ConnectionFailed("not connected".to_string()))?;

        debug!(command = %command, "executing remote command");

        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::Io(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ExecError::Io(e.to_string()))?;

        let mut status = -1;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        loop {
            let msg = channel.wait().await;

            match msg {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        // stderr
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    status = exit_status.cast_signed();
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        debug!(
            command = %command,
            status = status,
            duration = ?duration,
            "remote command completed"
        );

        Ok(CommandResult {
            command: command.to_string(),
            status,
            stdout,
            stderr,
            duration,
        })
    }

    /// Tear down the session, if one was established
    pub async fn disconnect(&self) -> Result<(), ExecError> {
        let mut session_lock = self.session.lock().await;

        if let Some(session) = session_lock.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
                .map_err(|e| ExecError::Io(e.to_string()))?;
            info!(host = %self.hostname, "SSH disconnected");
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for ParamikoBackend {
    fn connection_type(&self) -> &'static str {
        "paramiko"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.host)
    }

    #[instrument(skip(self), fields(host = %self.hostname))]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(quote::encode(template, args)?);

        // connect outside the per-command time bound
        self.connect().await?;

        match self.run_timeout {
            None => self.execute_remote(&command).await,
            Some(bound) => {
                let start = Instant::now();
                match timeout(bound, self.execute_remote(&command)).await {
                    Ok(result) => result,
                    Err(_) => {
                        error!(
                            command = %command,
                            timeout = ?bound,
                            elapsed = ?start.elapsed(),
                            "remote command timed out"
                        );
                        Err(ExecError::Timeout { timeout: bound })
                    }
                }
            }
        }
    }
}
