//! Error types for hostprobe-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while constructing or driving a backend
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// A command exited with a code outside the caller's success contract
    #[error("command '{command}' failed with exit code {status}: {stderr}")]
    CommandFailed {
        /// Fully encoded command that was executed
        command: String,
        /// Observed exit code
        status: i32,
        /// Captured stderr
        stderr: String,
    },

    /// Command did not finish within the configured time bound
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Malformed or unusable option value, detected at construction
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Command template / argument mismatch
    #[error("command template error: {0}")]
    Template(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    Io(String),

    /// Failed to reach the remote target
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication against the remote target failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl ExecError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExecError::ConnectionFailed(_) | ExecError::Timeout { .. }
        )
    }
}
