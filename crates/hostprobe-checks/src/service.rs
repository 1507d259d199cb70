//! Service state checks via systemctl

use std::sync::Arc;

use hostprobe_exec::Backend;

use crate::error::CheckError;

/// Checks against one systemd service
pub struct Service {
    backend: Arc<dyn Backend>,
    name: String,
}

impl Service {
    /// Create a check for the service `name`
    pub fn new(backend: Arc<dyn Backend>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Whether the service is currently active.
    ///
    /// `is-active` exits 3 for inactive and 1 for failed units; both
    /// are answers, not errors.
    pub async fn is_running(&self) -> Result<bool, CheckError> {
        let result = self
            .backend
            .run_expect(&[0, 1, 3], "systemctl is-active %s", &[&self.name])
            .await?;
        Ok(result.status == 0)
    }

    /// Whether the service starts at boot
    pub async fn is_enabled(&self) -> Result<bool, CheckError> {
        let result = self
            .backend
            .run_expect(&[0, 1], "systemctl is-enabled %s", &[&self.name])
            .await?;
        Ok(result.status == 0 && result.stdout.trim_end() == "enabled")
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<service {}>", self.name)
    }
}
