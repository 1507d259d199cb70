//! hostprobe-core: Backend resolution
//!
//! Turns compact host-specification strings (`transport://host?option=value`)
//! into constructed, deduplicated backend instances.

pub mod error;
pub mod factory;
pub mod hostspec;
pub mod registry;

pub use error::ResolveError;
pub use factory::{get_backend, get_backends};
pub use hostspec::{HostSpec, parse_hostspec};
pub use registry::Transport;
