//! Backend trait: the command execution contract

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// One executable target (local machine, remote host, container, ...)
///
/// `run` encodes a command template and executes it; a non-zero exit
/// code is reported through the result, never as an error. The two
/// convenience wrappers layer a success contract on top of `run`.
///
/// Instances are `Send + Sync` so different instances can be driven
/// from different tasks; a single instance expects one logical caller
/// at a time unless the transport documents otherwise.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Registered transport name, e.g. `"ssh"`
    fn connection_type(&self) -> &'static str;

    /// Target name, `None` for transports without an addressable target
    fn target(&self) -> Option<&str>;

    /// Encode `template` with quoted `args` and execute it.
    ///
    /// Fails only on transport-level problems (spawn, connection,
    /// timeout) or a malformed template, never on the command's own
    /// exit code.
    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError>;

    /// Run and require exit code 0.
    ///
    /// Returns stdout with exactly one trailing newline removed, so an
    /// intentional trailing blank line in multi-line output survives.
    async fn check_output(&self, template: &str, args: &[&str]) -> Result<String, ExecError> {
        let result = self.run(template, args).await?;
        if result.status != 0 {
            return Err(ExecError::CommandFailed {
                command: result.command,
                status: result.status,
                stderr: result.stderr,
            });
        }
        match result.stdout.strip_suffix('\n') {
            Some(stripped) => Ok(stripped.to_string()),
            None => Ok(result.stdout),
        }
    }

    /// Run and require the exit code to be one of `allowed`.
    ///
    /// An allowed non-zero code is a legitimate outcome the caller
    /// wants to branch on (`getent` returning 2 for "not found"), so
    /// the full result is handed back.
    async fn run_expect(
        &self,
        allowed: &[i32],
        template: &str,
        args: &[&str],
    ) -> Result<CommandResult, ExecError> {
        let result = self.run(template, args).await?;
        if !allowed.contains(&result.status) {
            return Err(ExecError::CommandFailed {
                command: result.command,
                status: result.status,
                stderr: result.stderr,
            });
        }
        Ok(result)
    }
}
