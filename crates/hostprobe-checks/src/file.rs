//! File state checks

use std::sync::Arc;

use hostprobe_exec::Backend;

use crate::error::CheckError;

/// Checks against one path on the target
pub struct File {
    backend: Arc<dyn Backend>,
    path: String,
}

impl File {
    /// Create a check for `path`
    pub fn new(backend: Arc<dyn Backend>, path: impl Into<String>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }

    async fn test(&self, template: &str) -> Result<bool, CheckError> {
        let result = self
            .backend
            .run_expect(&[0, 1], template, &[&self.path])
            .await?;
        Ok(result.status == 0)
    }

    /// Whether anything exists at the path
    pub async fn exists(&self) -> Result<bool, CheckError> {
        self.test("test -e %s").await
    }

    /// Whether the path is a regular file
    pub async fn is_file(&self) -> Result<bool, CheckError> {
        self.test("test -f %s").await
    }

    /// Whether the path is a directory
    pub async fn is_directory(&self) -> Result<bool, CheckError> {
        self.test("test -d %s").await
    }

    /// Whether the path is a symlink
    pub async fn is_symlink(&self) -> Result<bool, CheckError> {
        self.test("test -L %s").await
    }

    /// Permission bits, e.g. `0o644`
    pub async fn mode(&self) -> Result<u32, CheckError> {
        let out = self
            .backend
            .check_output("stat -c %%a %s", &[&self.path])
            .await?;
        u32::from_str_radix(&out, 8)
            .map_err(|_| CheckError::Parse(format!("unexpected mode '{out}' for '{}'", self.path)))
    }

    /// Owning user name
    pub async fn owner(&self) -> Result<String, CheckError> {
        Ok(self
            .backend
            .check_output("stat -c %%U %s", &[&self.path])
            .await?)
    }

    /// Owning group name
    pub async fn group(&self) -> Result<String, CheckError> {
        Ok(self
            .backend
            .check_output("stat -c %%G %s", &[&self.path])
            .await?)
    }

    /// Size in bytes
    pub async fn size(&self) -> Result<u64, CheckError> {
        let out = self
            .backend
            .check_output("stat -c %%s %s", &[&self.path])
            .await?;
        out.parse()
            .map_err(|_| CheckError::Parse(format!("unexpected size '{out}' for '{}'", self.path)))
    }

    /// File content
    pub async fn content(&self) -> Result<String, CheckError> {
        Ok(self.backend.check_output("cat -- %s", &[&self.path]).await?)
    }

    /// Fully resolved symlink destination
    pub async fn linked_to(&self) -> Result<String, CheckError> {
        Ok(self
            .backend
            .check_output("readlink -f %s", &[&self.path])
            .await?)
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<file {}>", self.path)
    }
}
