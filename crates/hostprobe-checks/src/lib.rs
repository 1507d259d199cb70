//! hostprobe-checks: host state checks
//!
//! Thin probes over the backend contract: each check holds a parameter
//! (a group name, a file path), runs one command template, and parses
//! the line-oriented result into typed values. All the transport logic
//! lives behind the backend.

pub mod error;
pub mod file;
pub mod group;
pub mod package;
pub mod service;
pub mod user;

pub use error::CheckError;
pub use file::File;
pub use group::Group;
pub use package::Package;
pub use service::Service;
pub use user::User;
