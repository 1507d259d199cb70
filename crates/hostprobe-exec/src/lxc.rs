//! Container exec transport framed over the lxc CLI

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Backend running commands inside an LXD instance via `lxc exec`
#[derive(Debug, Clone)]
pub struct LxcBackend {
    name: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl LxcBackend {
    /// Create a backend for the instance `name`
    pub fn new(name: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            run_timeout,
        })
    }
}

#[async_trait]
impl Backend for LxcBackend {
    fn connection_type(&self) -> &'static str {
        "lxc"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.name)
    }

    #[instrument(skip(self), fields(instance = %self.name), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = format!(
            "lxc exec {} -- /bin/sh -c {}",
            quote(&self.name),
            quote(&command)
        );
        run_shell(&framed, self.run_timeout).await
    }
}
