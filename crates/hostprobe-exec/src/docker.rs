//! Container exec transports framed over the docker and podman CLIs
//!
//! The target authority is `[user@]container`; both CLIs share the same
//! exec framing, so `podman` reuses this backend with a different
//! binary name.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Backend running commands inside a container via `<cli> exec`
#[derive(Debug, Clone)]
pub struct DockerBackend {
    /// Verbatim authority from the hostspec
    host: String,
    name: String,
    user: Option<String>,
    options: BackendOptions,
    run_timeout: Option<Duration>,
    cli: &'static str,
}

impl DockerBackend {
    /// Create a backend over the `docker` CLI
    pub fn new(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        Self::build(host, options, "docker")
    }

    /// Create a backend over the `podman` CLI
    pub fn new_podman(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        Self::build(host, options, "podman")
    }

    fn build(host: &str, options: &BackendOptions, cli: &'static str) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        let (user, name) = match host.split_once('@') {
            Some((user, name)) => (Some(user.to_string()), name),
            None => (None, host),
        };
        if name.is_empty() {
            return Err(ExecError::Config(format!(
                "unusable container name '{host}'"
            )));
        }
        Ok(Self {
            host: host.to_string(),
            name: name.to_string(),
            user,
            options: options.clone(),
            run_timeout,
            cli,
        })
    }
}

#[async_trait]
impl Backend for DockerBackend {
    fn connection_type(&self) -> &'static str {
        self.cli
    }

    fn target(&self) -> Option<&str> {
        Some(&self.host)
    }

    #[instrument(skip(self), fields(container = %self.name), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = match &self.user {
            Some(user) => format!(
                "{} exec -u {} {} /bin/sh -c {}",
                self.cli,
                quote(user),
                quote(&self.name),
                quote(&command)
            ),
            None => format!(
                "{} exec {} /bin/sh -c {}",
                self.cli,
                quote(&self.name),
                quote(&command)
            ),
        };
        run_shell(&framed, self.run_timeout).await
    }
}
