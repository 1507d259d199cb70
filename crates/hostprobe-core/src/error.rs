//! Error types for hostprobe-core

use thiserror::Error;

use hostprobe_exec::ExecError;

/// Errors that can occur while resolving hostspecs into backends
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Connection name is not a registered transport
    #[error("unknown connection type '{0}'")]
    UnknownConnection(String),

    /// A backend could not be constructed for a hostspec
    #[error("cannot build backend for '{hostspec}': {source}")]
    Backend {
        /// The hostspec string that triggered the failure
        hostspec: String,
        /// Underlying construction error
        #[source]
        source: ExecError,
    },
}
