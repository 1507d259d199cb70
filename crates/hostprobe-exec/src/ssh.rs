//! SSH transport framed over the OpenSSH client CLI
//!
//! `safe-ssh` shares the framing but never reuses a control master, so
//! every call pays for a fresh connection and cannot observe state from
//! a half-dead multiplexed session.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Backend shelling out to `ssh`
#[derive(Debug, Clone)]
pub struct SshBackend {
    host: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
    safe: bool,
}

impl SshBackend {
    /// Create an `ssh` backend for `host` (verbatim `[user@]host[:port]`
    /// authority, decomposition left to the OpenSSH client)
    pub fn new(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        Self::build(host, options, false)
    }

    /// Create a `safe-ssh` backend: one isolated connection per command
    pub fn new_safe(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        Self::build(host, options, true)
    }

    fn build(host: &str, options: &BackendOptions, safe: bool) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        if let Some(raw) = &options.controlpersist {
            raw.parse::<u64>()
                .map_err(|_| ExecError::Config(format!("invalid controlpersist '{raw}'")))?;
        }
        Ok(Self {
            host: host.to_string(),
            options: options.clone(),
            run_timeout,
            safe,
        })
    }

    fn prefix(&self) -> String {
        let mut parts = vec!["ssh".to_string()];
        if let Some(config) = &self.options.ssh_config {
            parts.push("-F".to_string());
            parts.push(quote(&config.display().to_string()));
        }
        if let Some(identity) = &self.options.ssh_identity_file {
            parts.push("-i".to_string());
            parts.push(quote(&identity.display().to_string()));
        }
        if self.safe {
            // force a dedicated connection per command
            parts.push("-o ControlMaster=no".to_string());
        } else if let Some(persist) = &self.options.controlpersist {
            parts.push("-o ControlMaster=auto".to_string());
            parts.push(format!("-o ControlPersist={persist}s"));
            parts.push("-o ControlPath=~/.ssh/hostprobe-%r@%h:%p".to_string());
        }
        parts.push(quote(&self.host));
        parts.join(" ")
    }
}

#[async_trait]
impl Backend for SshBackend {
    fn connection_type(&self) -> &'static str {
        if self.safe { "safe-ssh" } else { "ssh" }
    }

    fn target(&self) -> Option<&str> {
        Some(&self.host)
    }

    #[instrument(skip(self), fields(host = %self.host), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = format!("{} {}", self.prefix(), quote(&command));
        run_shell(&framed, self.run_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_includes_identity_and_config() {
        let options = BackendOptions {
            ssh_config: Some("/home/op/.ssh/config".into()),
            ssh_identity_file: Some("/home/op/.ssh/id_ed25519".into()),
            ..Default::default()
        };
        let backend = SshBackend::new("admin@web01", &options).unwrap();

        assert_eq!(
            backend.prefix(),
            "ssh -F /home/op/.ssh/config -i /home/op/.ssh/id_ed25519 admin@web01"
        );
    }

    #[test]
    fn test_controlpersist_framing() {
        let options = BackendOptions {
            controlpersist: Some("60".to_string()),
            ..Default::default()
        };
        let backend = SshBackend::new("web01", &options).unwrap();
        let prefix = backend.prefix();

        assert!(prefix.contains("-o ControlMaster=auto"));
        assert!(prefix.contains("-o ControlPersist=60s"));
    }

    #[test]
    fn test_safe_ssh_never_multiplexes() {
        let options = BackendOptions {
            controlpersist: Some("60".to_string()),
            ..Default::default()
        };
        let backend = SshBackend::new_safe("web01", &options).unwrap();
        let prefix = backend.prefix();

        assert_eq!(backend.connection_type(), "safe-ssh");
        assert!(prefix.contains("-o ControlMaster=no"));
        assert!(!prefix.contains("ControlPersist=60s"));
    }

    #[test]
    fn test_invalid_controlpersist_rejected_at_construction() {
        let options = BackendOptions {
            controlpersist: Some("forever".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            SshBackend::new("web01", &options),
            Err(ExecError::Config(_))
        ));
    }
}
