//! WinRM transport framed over the winrs CLI
//!
//! Commands are handed to the remote Windows shell as-is after template
//! encoding; `ssl`/`no_ssl` pick the endpoint scheme and
//! `no_verify_ssl` disables certificate checking.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

fn parse_secs(raw: &str, key: &str) -> Result<u64, ExecError> {
    raw.parse()
        .map_err(|_| ExecError::Config(format!("invalid {key} '{raw}'")))
}

/// Backend running commands on a Windows host via `winrs`
#[derive(Debug, Clone)]
pub struct WinRmBackend {
    host: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl WinRmBackend {
    /// Create a backend for `host`, validating the timeout pair.
    ///
    /// The read timeout must exceed the operation timeout, otherwise
    /// every long-running operation would be cut off by the socket.
    pub fn new(host: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let mut run_timeout = options.run_timeout()?;

        let read = options
            .read_timeout_sec
            .as_deref()
            .map(|raw| parse_secs(raw, "read_timeout_sec"))
            .transpose()?;
        let operation = options
            .operation_timeout_sec
            .as_deref()
            .map(|raw| parse_secs(raw, "operation_timeout_sec"))
            .transpose()?;
        if let (Some(read), Some(operation)) = (read, operation)
            && read <= operation
        {
            return Err(ExecError::Config(format!(
                "read_timeout_sec ({read}) must be greater than operation_timeout_sec ({operation})"
            )));
        }
        if run_timeout.is_none()
            && let Some(operation) = operation
        {
            run_timeout = Some(Duration::from_secs(operation));
        }

        Ok(Self {
            host: host.to_string(),
            options: options.clone(),
            run_timeout,
        })
    }

    fn prefix(&self) -> String {
        let scheme = if self.options.ssl && !self.options.no_ssl {
            "https"
        } else {
            "http"
        };
        let mut parts = vec![format!("winrs -r:{}://{}", scheme, quote(&self.host))];
        if self.options.no_verify_ssl {
            parts.push("-skipCAcheck".to_string());
        }
        parts.join(" ")
    }
}

#[async_trait]
impl Backend for WinRmBackend {
    fn connection_type(&self) -> &'static str {
        "winrm"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.host)
    }

    #[instrument(skip(self), fields(host = %self.host), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = encode(template, args)?;
        let framed = format!("{} {}", self.prefix(), quote(&command));
        run_shell(&framed, self.run_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_selects_https() {
        let options = BackendOptions {
            ssl: true,
            no_verify_ssl: true,
            ..Default::default()
        };
        let backend = WinRmBackend::new("win01:5986", &options).unwrap();
        assert_eq!(backend.prefix(), "winrs -r:https://win01:5986 -skipCAcheck");
    }

    #[test]
    fn test_plain_endpoint_by_default() {
        let backend = WinRmBackend::new("win01", &BackendOptions::default()).unwrap();
        assert_eq!(backend.prefix(), "winrs -r:http://win01");
    }

    #[test]
    fn test_timeout_pair_validated() {
        let options = BackendOptions {
            read_timeout_sec: Some("30".to_string()),
            operation_timeout_sec: Some("30".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            WinRmBackend::new("win01", &options),
            Err(ExecError::Config(_))
        ));

        let options = BackendOptions {
            read_timeout_sec: Some("forty".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            WinRmBackend::new("win01", &options),
            Err(ExecError::Config(_))
        ));
    }
}
