//! Chroot transport: commands run inside a directory tree on the
//! invoking machine

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Backend running commands through `chroot <dir>`
#[derive(Debug, Clone)]
pub struct ChrootBackend {
    /// Verbatim authority from the hostspec
    host: String,
    path: PathBuf,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl ChrootBackend {
    /// Create a backend for the tree rooted at `host`.
    ///
    /// The directory must exist; a missing tree is caught here instead
    /// of on the first command.
    pub fn new(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        let path = PathBuf::from(host);
        if !path.is_dir() {
            return Err(ExecError::Config(format!(
                "chroot directory '{host}' does not exist"
            )));
        }
        Ok(Self {
            host: host.to_string(),
            path,
            options: options.clone(),
            run_timeout,
        })
    }
}

#[async_trait]
impl Backend for ChrootBackend {
    fn connection_type(&self) -> &'static str {
        "chroot"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.host)
    }

    #[instrument(skip(self), fields(root = %self.path.display()), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = format!(
            "chroot {} /bin/sh -c {}",
            quote(&self.path.display().to_string()),
            quote(&command)
        );
        run_shell(&framed, self.run_timeout).await
    }
}
