//! Runtime error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::runner::ControlKind;

/// Errors surfaced by the server runner.
///
/// Every control request resolves to `Ok(())` or one of these; the messages
/// are shown to operators as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunnerError {
    /// Start requested while a process is held.
    #[error("Server is already running")]
    AlreadyRunning,

    /// Stop requested while no process is held.
    #[error("Server is not running")]
    NotRunning,

    /// The process exited before the request could be handled.
    #[error("Server process exited unexpectedly (exit code: {code:?})")]
    ExitedUnexpectedly { code: Option<i32> },

    #[error("Launch directory {0} does not exist")]
    LaunchDirMissing(PathBuf),

    #[error("Launcher {0} not found")]
    LauncherMissing(PathBuf),

    #[error("Failed to spawn server process: {0}")]
    Spawn(String),

    #[error("Failed to persist server stats: {0}")]
    Persist(String),

    #[error("Failed to load server stats from {path}: {reason}")]
    LoadStats { path: PathBuf, reason: String },

    /// The event loop is not running, so nothing can take the request.
    #[error("Server runner is not available")]
    Unavailable,

    #[error("Timed out waiting for {kind} to complete")]
    Timeout { kind: ControlKind },

    /// The event loop went away without answering.
    #[error("Server runner dropped the request")]
    Dropped,

    /// `run` was called a second time on the same runner.
    #[error("Server runner event loop is already started")]
    AlreadyStarted,
}

/// Errors surfaced by the event dispatcher.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DispatcherError {
    #[error("Requested scrollback {requested} exceeds the buffer size {buffer_size}")]
    ScrollbackTooLarge {
        requested: usize,
        buffer_size: usize,
    },

    #[error(
        "Buffer size cannot be greater than subscriber queue max size ({capacity}), got {buffer_size}"
    )]
    InvalidBufferSize { buffer_size: usize, capacity: usize },

    #[error("Subscriber queue capacity must be at least 1")]
    ZeroCapacity,
}
