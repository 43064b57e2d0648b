//! Path resolution for the data root and the server launch directory.
//!
//! Layout under the data root:
//! ```text
//! <data_root>/
//!   mc/
//!     current/            <- launch directory
//!       mcadmin-start.sh  <- launcher, installed by the instance manager
//!       server_stats.json <- persisted runner state
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the persisted stats file inside the launch directory.
pub const SERVER_STATS_FILE: &str = "server_stats.json";

/// Name of the launcher script inside the launch directory.
pub const LAUNCHER_SCRIPT: &str = "mcadmin-start.sh";

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "MCADMIN_DATA_DIR";

/// Errors that can occur during path resolution and directory operations.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// A path was expected to be a directory but was not.
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// An empty path was provided.
    #[error("Path cannot be empty")]
    EmptyPath,
}

/// Get the data root directory.
///
/// Resolution order:
/// 1. `MCADMIN_DATA_DIR` environment variable
/// 2. `<platform data dir>/mcadmin`
pub fn data_root() -> Result<PathBuf, PathError> {
    resolve_data_root(env::var(DATA_DIR_ENV).ok(), dirs::data_local_dir())
}

/// Pure resolution logic behind [`data_root`].
pub fn resolve_data_root(
    override_dir: Option<String>,
    platform_dir: Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    if let Some(dir) = override_dir {
        if dir.trim().is_empty() {
            return Err(PathError::EmptyPath);
        }
        return Ok(PathBuf::from(dir));
    }

    platform_dir
        .map(|dir| dir.join("mcadmin"))
        .ok_or(PathError::NoDataDir)
}

/// Launch directory for the active server instance.
pub fn launch_dir(data_root: &Path) -> PathBuf {
    data_root.join("mc").join("current")
}

/// Ensure the provided directory exists, creating it and its parents if missing.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
