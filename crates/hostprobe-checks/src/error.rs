//! Error types for hostprobe-checks

use thiserror::Error;

use hostprobe_exec::ExecError;

/// Errors that can occur while probing host state
#[derive(Error, Debug)]
pub enum CheckError {
    /// Command execution failed
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Command output did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// No supported package manager on the target
    #[error("no supported package manager found (tried dpkg-query, rpm)")]
    PackageProviderNotFound,
}
