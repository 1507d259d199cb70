//! Pod exec transport framed over the kubectl CLI

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Build the `<cli> exec ...` prefix shared by kubectl and oc
pub(crate) fn exec_prefix(cli: &str, pod: &str, options: &BackendOptions) -> String {
    let mut parts = vec![cli.to_string()];
    if let Some(kubeconfig) = &options.kubeconfig {
        parts.push(format!("--kubeconfig={}", quote(kubeconfig)));
    }
    if let Some(context) = &options.context {
        parts.push(format!("--context={}", quote(context)));
    }
    parts.push("exec".to_string());
    if let Some(namespace) = &options.namespace {
        parts.push(format!("--namespace={}", quote(namespace)));
    }
    if let Some(container) = &options.container {
        parts.push("-c".to_string());
        parts.push(quote(container));
    }
    parts.push(quote(pod));
    parts.push("--".to_string());
    parts.join(" ")
}

/// Backend running commands inside a pod via `kubectl exec`
#[derive(Debug, Clone)]
pub struct KubectlBackend {
    pod: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl KubectlBackend {
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
impl Backend for KubectlBackend {
    fn connection_type(&self) -> &'static str {
        "kubectl"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.pod)
    }

    #[instrument(skip(self), fields(pod = %self.pod), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = format!(
            "{} /bin/sh -c {}",
            exec_prefix("kubectl", &self.pod, &self.options),
            quote(&command)
        );
        run_shell(&framed, self.run_timeout).await
    }
}
