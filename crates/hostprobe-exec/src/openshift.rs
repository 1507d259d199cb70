//! Pod exec transport framed over the OpenShift oc CLI
//!
//! Same framing as kubectl with the `oc` binary.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::kubectl::exec_prefix;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Backend running commands inside a pod via `oc exec`
#[derive(Debug, Clone)]
pub struct OpenShiftBackend {
    pod: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl OpenShiftBackend {
    /// Create a backend for `pod`
    pub fn new(pod: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        Ok(Self {
            pod: pod.to_string(),
            options: options.clone(),
            run_timeout,
        })
    }
}

#[async_trait]
impl Backend for OpenShiftBackend {
    fn connection_type(&self) -> &'static str {
        "openshift"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.pod)
    }

    #[instrument(skip(self), fields(pod = %self.pod), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = format!(
            "{} /bin/sh -c {}",
            exec_prefix("oc", &self.pod, &self.options),
            quote(&command)
        );
        run_shell(&framed, self.run_timeout).await
    }
}
