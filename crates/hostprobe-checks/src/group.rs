//! Unix group checks

use std::sync::Arc;

use hostprobe_exec::Backend;

use crate::error::CheckError;

/// Checks against one unix group
pub struct Group {
    backend: Arc<dyn Backend>,
    name: String,
}

impl Group {
    /// Create a check for the group `name`
    pub fn new(backend: Arc<dyn Backend>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Whether the group exists.
    ///
    /// `getent` exits 2 for "not found", which is a legitimate answer
    /// here, not a failure.
    pub async fn exists(&self) -> Result<bool, CheckError> {
        let result = self
            .backend
            .run_expect(&[0, 2], "getent group %s", &[&self.name])
            .await?;
        Ok(result.status == 0)
    }

    /// Numeric group id
    pub async fn gid(&self) -> Result<u32, CheckError> {
        let out = self
            .backend
            .check_output("getent group %s | cut -d':' -f3", &[&self.name])
            .await?;
        out.parse()
            .map_err(|_| CheckError::Parse(format!("unexpected gid '{out}' for group '{}'", self.name)))
    }

    /// Users that are members of this group
    pub async fn members(&self) -> Result<Vec<String>, CheckError> {
        let users = self
            .backend
            .check_output("getent group %s | cut -d':' -f4", &[&self.name])
            .await?;
        if users.is_empty() {
            return Ok(Vec::new());
        }
        Ok(users.split(',').map(str::to_string).collect())
    }

    /// All local and remote group names known to the target
    pub async fn all_groups(&self) -> Result<Vec<String>, CheckError> {
        let out = self.backend.check_output("getent group", &[]).await?;
        Ok(first_columns(&out))
    }

    /// Group names defined in the target's local group database
    pub async fn local_groups(&self) -> Result<Vec<String>, CheckError> {
        let out = self.backend.check_output("cat /etc/group", &[]).await?;
        Ok(first_columns(&out))
    }
}

fn first_columns(out: &str) -> Vec<String> {
    out.lines()
        .filter_map(|line| line.split(':').next())
        .map(str::to_string)
        .collect()
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<group {}>", self.name)
    }
}
