//! Result type for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result of a command execution
///
/// A non-zero exit code is a regular outcome, not an error; backends
/// return `CommandResult` for whatever the target command did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Fully encoded command that was executed
    pub command: String,
    /// Exit status code (0 for success)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }
}
