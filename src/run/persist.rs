//! Run log persistence

use std::fs;
use std::path::{Path, PathBuf};

use super::RunLog;
use crate::Result;

/// Finish `log` and write it as JSON to `<summary_folder>/<run_name>/<log_file>`.
///
/// The run directory is created if needed and an existing log file is
/// truncated. Runs sharing a directory and file name overwrite each other.
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the directory cannot be created or the
/// file cannot be written.
pub fn save_log(
    log: &mut RunLog,
    summary_folder: impl AsRef<Path>,
    run_name: &str,
    log_file: &str,
) -> Result<PathBuf> {
    log.finish();

    let dirname = summary_folder.as_ref().join(run_name);
    ensure_dir_exists(&dirname)?;

    let path = dirname.join(log_file);
    fs::write(&path, serde_json::to_string(&*log)?)?;
    tracing::debug!(path = %path.display(), "wrote run log");

    Ok(path)
}

/// Create `dir_name` and any missing parents. An existing directory is fine.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] on permission errors or when a non-directory
/// already occupies the path.
pub fn ensure_dir_exists(dir_name: impl AsRef<Path>) -> Result<()> {
    let dir_name = dir_name.as_ref();
    if !dir_name.is_dir() {
        tracing::debug!(dir = %dir_name.display(), "creating directory");
        fs::create_dir_all(dir_name)?;
    }
    Ok(())
}
