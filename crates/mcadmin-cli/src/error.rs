//! CLI-specific error types and mappings.
//!
//! Library errors are folded into [`CliError`], whose categories map to
//! sysexits-style exit codes.

use mcadmin_core::{PathError, SettingsError};
use mcadmin_rcon::RconError;
use mcadmin_runtime::{DispatcherError, RunnerError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration or path resolution.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Supervisor refused or failed a request.
    #[error("Server error: {0}")]
    Runner(String),

    /// RCON server unreachable or the command failed.
    #[error("{0}")]
    Rcon(String),

    /// Terminal prompt failure.
    #[error("Console error: {0}")]
    Console(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// - 1: General error
    /// - 64-78: see sysexits.h
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Runner(_) => 1,
            Self::Rcon(_) => 69,    // EX_UNAVAILABLE
            Self::Console(_) => 71, // EX_OSERR
            Self::Io(_) => 74,      // EX_IOERR
            Self::Config(_) => 78,  // EX_CONFIG
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<DispatcherError> for CliError {
    fn from(err: DispatcherError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RunnerError> for CliError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::LoadStats { .. } | RunnerError::Persist(_) => Self::Io(err.to_string()),
            RunnerError::LaunchDirMissing(_) | RunnerError::LauncherMissing(_) => {
                Self::Config(err.to_string())
            }
            other => Self::Runner(other.to_string()),
        }
    }
}

impl From<RconError> for CliError {
    fn from(err: RconError) -> Self {
        Self::Rcon(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Self::Console(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_runner_errors_map_to_categories() {
        let missing = CliError::from(RunnerError::LauncherMissing(PathBuf::from("/srv/x.sh")));
        assert_eq!(missing.exit_code(), 78);

        let busy = CliError::from(RunnerError::AlreadyRunning);
        assert_eq!(busy.exit_code(), 1);
        assert_eq!(busy.to_string(), format!("Server error: {}", RunnerError::AlreadyRunning));
    }

    #[test]
    fn test_rcon_error_keeps_message() {
        let err = CliError::from(RconError::Auth);
        assert_eq!(err.to_string(), "RCON authentication failed");
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn test_settings_error_is_config() {
        let err = CliError::from(SettingsError::InvalidRconPort);
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 78);
    }
}
