//! Resolved backend options
//!
//! One typed structure instead of a string-keyed map: every recognized
//! hostspec query key has a named field. Boolean flags use `false` for
//! "not given", so a flag is observably set only when it was `true` in
//! the hostspec, and the whole structure participates in backend
//! deduplication via `Eq + Hash`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;
use crate::quote::quote;

/// Connection options for a single backend instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendOptions {
    /// Transport name, when explicitly given by hostspec or caller
    pub connection: Option<String>,

    // boolean flags
    /// Wrap every command in sudo
    pub sudo: bool,
    /// Use an SSL endpoint (winrm)
    pub ssl: bool,
    /// Force a plain endpoint (winrm)
    pub no_ssl: bool,
    /// Skip certificate verification (winrm)
    pub no_verify_ssl: bool,
    /// Run through the ansible CLI even when a faster path exists
    pub force_ansible: bool,

    // string-valued options
    /// User to sudo into (implies a `-u` flag on the sudo wrapper)
    pub sudo_user: Option<String>,
    /// Kubernetes namespace
    pub namespace: Option<String>,
    /// Container name, for pods running more than one
    pub container: Option<String>,
    /// Socket read timeout in seconds (winrm)
    pub read_timeout_sec: Option<String>,
    /// Operation timeout in seconds (winrm)
    pub operation_timeout_sec: Option<String>,
    /// Per-command timeout in whole seconds
    pub timeout: Option<String>,
    /// OpenSSH ControlPersist setting
    pub controlpersist: Option<String>,
    /// Explicit kubeconfig file
    pub kubeconfig: Option<String>,
    /// Kubernetes context name
    pub context: Option<String>,

    // path-valued options (leading `~` already expanded by the parser)
    /// OpenSSH client configuration file
    pub ssh_config: Option<PathBuf>,
    /// Ansible inventory file
    pub ansible_inventory: Option<PathBuf>,
    /// SSH private key file
    pub ssh_identity_file: Option<PathBuf>,
}

impl BackendOptions {
    /// Merge caller defaults under the values already present.
    ///
    /// Setdefault semantics: anything the hostspec set is never
    /// overwritten, a default only fills a hole.
    #[must_use]
    pub fn merge_defaults(mut self, defaults: &BackendOptions) -> Self {
        self.connection = self.connection.or_else(|| defaults.connection.clone());

        self.sudo = self.sudo || defaults.sudo;
        self.ssl = self.ssl || defaults.ssl;
        self.no_ssl = self.no_ssl || defaults.no_ssl;
        self.no_verify_ssl = self.no_verify_ssl || defaults.no_verify_ssl;
        self.force_ansible = self.force_ansible || defaults.force_ansible;

        self.sudo_user = self.sudo_user.or_else(|| defaults.sudo_user.clone());
        self.namespace = self.namespace.or_else(|| defaults.namespace.clone());
        self.container = self.container.or_else(|| defaults.container.clone());
        self.read_timeout_sec = self
            .read_timeout_sec
            .or_else(|| defaults.read_timeout_sec.clone());
        self.operation_timeout_sec = self
            .operation_timeout_sec
            .or_else(|| defaults.operation_timeout_sec.clone());
        self.timeout = self.timeout.or_else(|| defaults.timeout.clone());
        self.controlpersist = self
            .controlpersist
            .or_else(|| defaults.controlpersist.clone());
        self.kubeconfig = self.kubeconfig.or_else(|| defaults.kubeconfig.clone());
        self.context = self.context.or_else(|| defaults.context.clone());

        self.ssh_config = self.ssh_config.or_else(|| defaults.ssh_config.clone());
        self.ansible_inventory = self
            .ansible_inventory
            .or_else(|| defaults.ansible_inventory.clone());
        self.ssh_identity_file = self
            .ssh_identity_file
            .or_else(|| defaults.ssh_identity_file.clone());

        self
    }

    /// Set the transport name
    #[must_use]
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    /// Enable sudo wrapping
    #[must_use]
    pub fn with_sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    /// Per-command timeout, validated once at backend construction
    pub(crate) fn run_timeout(&self) -> Result<Option<Duration>, ExecError> {
        match &self.timeout {
            None => Ok(None),
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| ExecError::Config(format!("invalid timeout '{raw}'")))?;
                Ok(Some(Duration::from_secs(secs)))
            }
        }
    }

    /// Wrap an encoded command in sudo when requested
    pub(crate) fn wrap_sudo(&self, command: String) -> String {
        if !self.sudo {
            return command;
        }
        match &self.sudo_user {
            Some(user) => format!("sudo -u {} /bin/sh -c {}", quote(user), quote(&command)),
            None => format!("sudo /bin/sh -c {}", quote(&command)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults_does_not_overwrite() {
        let parsed = BackendOptions::default()
            .with_connection("docker")
            .with_sudo();
        let defaults = BackendOptions {
            connection: Some("ssh".to_string()),
            sudo_user: Some("admin".to_string()),
            ..Default::default()
        };

        let merged = parsed.merge_defaults(&defaults);
        assert_eq!(merged.connection.as_deref(), Some("docker"));
        assert!(merged.sudo);
        assert_eq!(merged.sudo_user.as_deref(), Some("admin"));
    }

    #[test]
    fn test_run_timeout_rejects_garbage() {
        let options = BackendOptions {
            timeout: Some("ten".to_string()),
            ..Default::default()
        };
        assert!(matches!(options.run_timeout(), Err(ExecError::Config(_))));

        let options = BackendOptions {
            timeout: Some("10".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.run_timeout().unwrap(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_wrap_sudo() {
        let plain = BackendOptions::default();
        assert_eq!(plain.wrap_sudo("id".to_string()), "id");

        let sudo = BackendOptions::default().with_sudo();
        assert_eq!(
            sudo.wrap_sudo("id -u".to_string()),
            "sudo /bin/sh -c 'id -u'"
        );

        let as_user = BackendOptions {
            sudo: true,
            sudo_user: Some("postgres".to_string()),
            ..Default::default()
        };
        assert_eq!(
            as_user.wrap_sudo("id -u".to_string()),
            "sudo -u postgres /bin/sh -c 'id -u'"
        );
    }
}
