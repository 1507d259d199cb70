//! Unix user checks

use std::sync::Arc;

use hostprobe_exec::Backend;

use crate::error::CheckError;

/// Checks against one unix user account
pub struct User {
    backend: Arc<dyn Backend>,
    name: String,
}

impl User {
    /// Create a check for the user `name`
    pub fn new(backend: Arc<dyn Backend>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Whether the account exists
    pub async fn exists(&self) -> Result<bool, CheckError> {
        let result = self
            .backend
            .run_expect(&[0, 2], "getent passwd %s", &[&self.name])
            .await?;
        Ok(result.status == 0)
    }

    /// Numeric user id
    pub async fn uid(&self) -> Result<u32, CheckError> {
        let out = self.backend.check_output("id -u %s", &[&self.name]).await?;
        out.parse()
            .map_err(|_| CheckError::Parse(format!("unexpected uid '{out}' for user '{}'", self.name)))
    }

    /// Numeric id of the primary group
    pub async fn gid(&self) -> Result<u32, CheckError> {
        let out = self.backend.check_output("id -g %s", &[&self.name]).await?;
        out.parse()
            .map_err(|_| CheckError::Parse(format!("unexpected gid '{out}' for user '{}'", self.name)))
    }

    /// Names of all groups the user belongs to
    pub async fn groups(&self) -> Result<Vec<String>, CheckError> {
        let out = self.backend.check_output("id -nG %s", &[&self.name]).await?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    /// Home directory from the passwd database
    pub async fn home(&self) -> Result<String, CheckError> {
        Ok(self
            .backend
            .check_output("getent passwd %s | cut -d':' -f6", &[&self.name])
            .await?)
    }

    /// Login shell from the passwd database
    pub async fn shell(&self) -> Result<String, CheckError> {
        Ok(self
            .backend
            .check_output("getent passwd %s | cut -d':' -f7", &[&self.name])
            .await?)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<user {}>", self.name)
    }
}
