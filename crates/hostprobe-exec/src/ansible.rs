//! Ansible transport framed over the ansible CLI
//!
//! Commands go through the `shell` module against a host pattern from
//! an inventory; the pattern is also how one hostspec expands into many
//! concrete targets. This shim always routes through the ansible CLI,
//! so the `force_ansible` flag only distinguishes backend identity.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Enumerate the concrete hosts an inventory pattern covers.
///
/// Shells out to `ansible --list-hosts`; the pattern defaults to `all`
/// when the hostspec named no host.
pub async fn list_hosts(
    pattern: Option<&str>,
    inventory: Option<&Path>,
) -> Result<Vec<String>, ExecError> {
    let mut framed = "ansible --list-hosts".to_string();
    if let Some(inventory) = inventory {
        framed.push_str(&format!(" -i {}", quote(&inventory.display().to_string())));
    }
    framed.push(' ');
    framed.push_str(&quote(pattern.unwrap_or("all")));

    let result = run_shell(&framed, None).await?;
    if result.status != 0 {
        return Err(ExecError::Config(format!(
            "ansible inventory enumeration failed: {}",
            result.stderr.trim()
        )));
    }

    // Output is a "hosts (N):" header followed by one indented name per line
    let hosts: Vec<String> = result
        .stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    debug!(count = hosts.len(), "expanded ansible pattern");
    Ok(hosts)
}

/// Backend running commands on one inventory host
#[derive(Debug, Clone)]
pub struct AnsibleBackend {
    host: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl AnsibleBackend {
    /// Create a backend for the inventory host `host`
    pub fn new(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        Ok(Self {
            host: host.to_string(),
            options: options.clone(),
            run_timeout,
        })
    }

    fn prefix(&self) -> String {
        let mut parts = vec!["ansible".to_string(), quote(&self.host)];
        if let Some(inventory) = &self.options.ansible_inventory {
            parts.push("-i".to_string());
            parts.push(quote(&inventory.display().to_string()));
        }
        // privilege escalation goes through ansible itself, not a local
        // sudo wrapper
        if self.options.sudo {
            parts.push("--become".to_string());
            if let Some(user) = &self.options.sudo_user {
                parts.push(format!("--become-user={}", quote(user)));
            }
        }
        parts.join(" ")
    }
}

#[async_trait]
impl Backend for AnsibleBackend {
    fn connection_type(&self) -> &'static str {
        "ansible"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.host)
    }

    #[instrument(skip(self), fields(host = %self.host), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = encode(template, args)?;
        let framed = format!("{} -m shell -a {}", self.prefix(), quote(&command));
        run_shell(&framed, self.run_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_with_inventory_and_become() {
        let options = BackendOptions {
            sudo: true,
            sudo_user: Some("deploy".to_string()),
            ansible_inventory: Some("/etc/ansible/hosts".into()),
            ..Default::default()
        };
        let backend = AnsibleBackend::new("web01", &options).unwrap();

        assert_eq!(
            backend.prefix(),
            "ansible web01 -i /etc/ansible/hosts --become --become-user=deploy"
        );
    }
}
