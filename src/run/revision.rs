//! Source revision resolution

use std::path::PathBuf;
use std::process::Command;

use crate::{Error, Result};

/// Source of the revision hash recorded in a run log when none is given.
pub trait RevisionSource {
    /// Return the raw bytes identifying the current HEAD revision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalToolFailure`] if the revision cannot be determined.
    fn head_revision(&self) -> Result<Vec<u8>>;
}

impl<F> RevisionSource for F
where
    F: Fn() -> Result<Vec<u8>>,
{
    fn head_revision(&self) -> Result<Vec<u8>> {
        self()
    }
}

/// Resolves HEAD with `git rev-parse HEAD`.
///
/// The call blocks until git exits; there is no timeout.
#[derive(Debug, Clone, Default)]
pub struct GitRevision {
    workdir: Option<PathBuf>,
}

impl GitRevision {
    /// Query the repository containing the current directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { workdir: None }
    }

    /// Query the repository containing `workdir`.
    #[must_use]
    pub fn in_dir(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
        }
    }
}

impl RevisionSource for GitRevision {
    fn head_revision(&self) -> Result<Vec<u8>> {
        let mut command = Command::new("git");
        command.args(["rev-parse", "HEAD"]);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| Error::ExternalToolFailure {
            tool: "git".into(),
            message: format!("failed to run git: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, "git rev-parse HEAD failed");
            return Err(Error::ExternalToolFailure {
                tool: "git".into(),
                message: format!("git rev-parse HEAD exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let source = || -> Result<Vec<u8>> { Ok(b"abc\n".to_vec()) };
        assert_eq!(source.head_revision().unwrap(), b"abc\n".to_vec());
    }

    #[test]
    fn test_git_outside_repository_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = GitRevision::in_dir(dir.path()).head_revision();
        // Either git is missing or the directory is not a repository.
        assert!(matches!(result, Err(Error::ExternalToolFailure { .. })));
    }
}
