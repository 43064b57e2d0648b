//! CLI bootstrap: resolves the directories every handler works against.

use std::fmt;
use std::path::{Path, PathBuf};

use mcadmin_core::{data_root, launch_dir};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;

/// Directories resolved for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliPaths {
    pub data_root: PathBuf,
    pub launch_dir: PathBuf,
}

impl CliPaths {
    /// Resolve from optional overrides.
    ///
    /// Without `data_dir` the data root comes from `MCADMIN_DATA_DIR` or the
    /// platform data dir. Without `launch_dir` the launch directory is
    /// `<data_root>/mc/current`.
    pub fn resolve(data_dir: Option<&Path>, launch: Option<&Path>) -> Result<Self, CliError> {
        let data_root = match data_dir {
            Some(dir) if dir.as_os_str().is_empty() => {
                return Err(CliError::Config("Data directory cannot be empty".to_string()));
            }
            Some(dir) => dir.to_path_buf(),
            None => data_root()?,
        };
        let launch_dir = launch.map_or_else(|| launch_dir(&data_root), Path::to_path_buf);
        Ok(Self {
            data_root,
            launch_dir,
        })
    }
}

impl fmt::Display for CliPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data_root = {}", self.data_root.display())?;
        write!(f, "launch_dir = {}", self.launch_dir.display())
    }
}

/// Everything handlers share.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub paths: CliPaths,
}

/// Build the context for a parsed command line.
pub fn bootstrap(cli: &Cli) -> Result<CliContext, CliError> {
    let paths = CliPaths::resolve(cli.data_dir.as_deref(), cli.launch_dir.as_deref())?;
    debug!(
        data_root = %paths.data_root.display(),
        launch_dir = %paths.launch_dir.display(),
        "Resolved paths"
    );
    Ok(CliContext { paths })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_dir_defaults_under_data_root() {
        let paths = CliPaths::resolve(Some(Path::new("/srv/mcadmin")), None).unwrap();
        assert_eq!(paths.data_root, PathBuf::from("/srv/mcadmin"));
        assert_eq!(paths.launch_dir, PathBuf::from("/srv/mcadmin/mc/current"));
    }

    #[test]
    fn test_launch_dir_override_wins() {
        let paths =
            CliPaths::resolve(Some(Path::new("/srv/mcadmin")), Some(Path::new("/opt/mc"))).unwrap();
        assert_eq!(paths.launch_dir, PathBuf::from("/opt/mc"));
    }

    #[test]
    fn test_empty_data_dir_is_rejected() {
        let err = CliPaths::resolve(Some(Path::new("")), None).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_display_is_key_value() {
        let paths = CliPaths::resolve(Some(Path::new("/srv/mcadmin")), None).unwrap();
        assert_eq!(
            paths.to_string(),
            "data_root = /srv/mcadmin\nlaunch_dir = /srv/mcadmin/mc/current"
        );
    }
}
