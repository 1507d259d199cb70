//! Local command execution using `tokio::process`
//!
//! Also hosts the shared process runner every CLI-framed transport shim
//! delegates to.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::error::ExecError;
use crate::options::BackendOptions;
use crate::quote;
use crate::result::CommandResult;
use crate::traits::Backend;

/// Spawn `command` through `sh -c` and collect its output.
///
/// Used directly by [`LocalBackend`] and by every transport shim that
/// frames commands into an external CLI (ssh, docker, kubectl, ...).
pub(crate) async fn run_shell(
    command: &str,
    run_timeout: Option<Duration>,
) -> Result<CommandResult, ExecError> {
    match run_timeout {
        None => spawn_shell(command).await,
        Some(bound) => {
            let start = Instant::now();
            match timeout(bound, spawn_shell(command)).await {
                Ok(result) => result,
                Err(_) => {
                    error!(
                        command = %command,
                        timeout = ?bound,
                        elapsed = ?start.elapsed(),
                        "command timed out"
                    );
                    Err(ExecError::Timeout { timeout: bound })
                }
            }
        }
    }
}

async fn spawn_shell(command: &str) -> Result<CommandResult, ExecError> {
    let start = Instant::now();

    debug!(command = %command, "executing shell command");

    // Use a shell to support pipes, redirections, etc.
    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| ExecError::Spawn(e.to_string()))?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| ExecError::Io(e.to_string()))?;

    let duration = start.elapsed();
    let status = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    debug!(
        command = %command,
        status = status,
        duration = ?duration,
        "command completed"
    );

    Ok(CommandResult {
        command: command.to_string(),
        status,
        stdout,
        stderr,
        duration,
    })
}

/// Backend for the invoking machine itself
///
/// The only transport constructed without a target name.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl LocalBackend {
    /// Create a local backend, validating option values up front
    pub fn new(options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        Ok(Self {
            options: options.clone(),
            run_timeout,
        })
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn connection_type(&self) -> &'static str {
        "local"
    }

    fn target(&self) -> Option<&str> {
        None
    }

    #[instrument(skip(self), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(quote::encode(template, args)?);
        run_shell(&command, self.run_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let backend = LocalBackend::new(&BackendOptions::default()).unwrap();
        let result = backend.run("echo hello", &[]).await.unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_is_not_an_error() {
        let backend = LocalBackend::new(&BackendOptions::default()).unwrap();
        let result = backend.run("exit 42", &[]).await.unwrap();

        assert!(!result.success());
        assert_eq!(result.status, 42);
    }

    #[tokio::test]
    async fn test_run_quotes_arguments() {
        let backend = LocalBackend::new(&BackendOptions::default()).unwrap();
        let result = backend
            .run("echo %s", &["first; echo second"])
            .await
            .unwrap();

        assert_eq!(result.stdout, "first; echo second\n");
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let options = BackendOptions {
            timeout: Some("0".to_string()),
            ..Default::default()
        };
        let backend = LocalBackend::new(&options).unwrap();
        let result = backend.run("sleep 5", &[]).await;

        assert!(matches!(result, Err(ExecError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_check_output_strips_one_newline() {
        let backend = LocalBackend::new(&BackendOptions::default()).unwrap();
        let out = backend
            .check_output("printf %s", &["root\nwheel\n"])
            .await
            .unwrap();

        assert_eq!(out, "root\nwheel");

        let out = backend
            .check_output("printf %s", &["trailing\n\n"])
            .await
            .unwrap();
        assert_eq!(out, "trailing\n");
    }

    #[tokio::test]
    async fn test_check_output_failure_carries_stderr() {
        let backend = LocalBackend::new(&BackendOptions::default()).unwrap();
        let err = backend
            .check_output("echo nope >&2; exit 3", &[])
            .await
            .unwrap_err();

        match err {
            ExecError::CommandFailed {
                status, stderr, ..
            } => {
                assert_eq!(status, 3);
                assert_eq!(stderr.trim(), "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_expect_allows_listed_codes() {
        let backend = LocalBackend::new(&BackendOptions::default()).unwrap();
        let result = backend.run_expect(&[0, 2], "exit 2", &[]).await.unwrap();
        assert_eq!(result.status, 2);

        let err = backend.run_expect(&[0], "exit 2", &[]).await;
        assert!(matches!(err, Err(ExecError::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn test_bad_timeout_fails_at_construction() {
        let options = BackendOptions {
            timeout: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            LocalBackend::new(&options),
            Err(ExecError::Config(_))
        ));
    }
}
