//! Salt transport framed over the salt CLI
//!
//! Runs `cmd.run_all` on the target minion and decodes the JSON
//! summary back into a command result.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::error::ExecError;
use crate::local::run_shell;
use crate::options::BackendOptions;
use crate::quote::{encode, quote};
use crate::result::CommandResult;
use crate::traits::Backend;

/// Shape of one minion's `cmd.run_all` return
#[derive(Debug, Deserialize)]
struct RunAllReturn {
    retcode: i32,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

/// Backend running commands on a salt minion
#[derive(Debug, Clone)]
pub struct SaltBackend {
    minion: String,
    options: BackendOptions,
    run_timeout: Option<Duration>,
}

impl SaltBackend {
    /// Create a backend for `minion`
    pub fn new(minion: &str, options: &BackendOptions) -> Result<Self, ExecError> {
        let run_timeout = options.run_timeout()?;
        Ok(Self {
            minion: minion.to_string(),
            options: options.clone(),
            run_timeout,
        })
    }
}

#[async_trait]
impl Backend for SaltBackend {
    fn connection_type(&self) -> &'static str {
        "salt"
    }

    fn target(&self) -> Option<&str> {
        Some(&self.minion)
    }

    #[instrument(skip(self), fields(minion = %self.minion), level = "debug")]
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = self.options.wrap_sudo(encode(template, args)?);
        let framed = format!(
            "salt --out=json --static {} cmd.run_all {}",
            quote(&self.minion),
            quote(&command)
        );
        let raw = run_shell(&framed, self.run_timeout).await?;

        // The salt CLI exits non-zero for its own failures too; only a
        // decodable per-minion return is a command outcome.
        let mut decoded: std::collections::HashMap<String, RunAllReturn> =
            serde_json::from_str(&raw.stdout).map_err(|e| {
                ExecError::Io(format!(
                    "unexpected salt output for '{}': {e}",
                    self.minion
                ))
            })?;
        let ret = decoded.remove(&self.minion).ok_or_else(|| {
            ExecError::Io(format!("no return for minion '{}'", self.minion))
        })?;

        Ok(CommandResult {
            command,
            status: ret.retcode,
            stdout: ret.stdout,
            stderr: ret.stderr,
            duration: raw.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_run_all_return() {
        let payload = r#"{"db01": {"pid": 4131, "retcode": 2, "stdout": "", "stderr": "no such group"}}"#;
        let decoded: std::collections::HashMap<String, RunAllReturn> =
            serde_json::from_str(payload).unwrap();

        let ret = &decoded["db01"];
        assert_eq!(ret.retcode, 2);
        assert_eq!(ret.stderr, "no such group");
    }
}
