//! Package presence checks
//!
//! The provider is probed per call: dpkg first, then rpm. Targets
//! without either database are unsupported.

use std::sync::Arc;

use tracing::debug;

use hostprobe_exec::Backend;

use crate::error::CheckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Dpkg,
    Rpm,
}

/// Checks against one installed package
pub struct Package {
    backend: Arc<dyn Backend>,
    name: String,
}

impl Package {
    /// Create a check for the package `name`
    pub fn new(backend: Arc<dyn Backend>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    async fn provider(&self) -> Result<Provider, CheckError> {
        if self
            .backend
            .run("command -v dpkg-query", &[])
            .await?
            .success()
        {
            debug!(package = %self.name, "using dpkg provider");
            return Ok(Provider::Dpkg);
        }
        if self.backend.run("command -v rpm", &[]).await?.success() {
            debug!(package = %self.name, "using rpm provider");
            return Ok(Provider::Rpm);
        }
        Err(CheckError::PackageProviderNotFound)
    }

    /// Whether the package is installed
    pub async fn is_installed(&self) -> Result<bool, CheckError> {
        match self.provider().await? {
            Provider::Dpkg => {
                let result = self
                    .backend
                    .run_expect(
                        &[0, 1],
                        "dpkg-query -f '${Status}' -W %s",
                        &[&self.name],
                    )
                    .await?;
                Ok(result.status == 0 && result.stdout.contains("ok installed"))
            }
            Provider::Rpm => {
                let result = self
                    .backend
                    .run_expect(&[0, 1], "rpm -q %s", &[&self.name])
                    .await?;
                Ok(result.status == 0)
            }
        }
    }

    /// Installed version string
    pub async fn version(&self) -> Result<String, CheckError> {
        match self.provider().await? {
            Provider::Dpkg => Ok(self
                .backend
                .check_output("dpkg-query -f '${Version}' -W %s", &[&self.name])
                .await?),
            Provider::Rpm => Ok(self
                .backend
                .check_output("rpm -q --qf '%%{VERSION}-%%{RELEASE}' %s", &[&self.name])
                .await?),
        }
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<package {}>", self.name)
    }
}
