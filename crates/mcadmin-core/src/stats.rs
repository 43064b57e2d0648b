//! Persisted server stats and the views derived from them.
//!
//! `ServerStats` is the durable record kept in `server_stats.json` inside the
//! launch directory. It is only ever changed by merging a `StatsUpdate` into
//! it, so every mutation can be persisted and republished in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Durable state of the supervised server.
///
/// Field names are the on-disk JSON keys. Missing keys fall back to their
/// defaults so an older or partial file still loads as "stopped".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStats {
    /// Operator intent: the server should be running.
    pub started: bool,
    /// When the current process was launched.
    pub started_at: Option<DateTime<Utc>>,
    /// The log stream has reported the world as loaded.
    pub initialized: bool,
    /// PID of the live child process, if one is held.
    pub pid: Option<u32>,
    /// Best-effort online player count derived from the log stream.
    pub players: u32,
    /// Last observed exit code, kept after a stop or crash.
    pub exit_code: Option<i32>,
}

impl ServerStats {
    /// Lifecycle status derived from the `started`/`initialized` flags.
    pub const fn status(&self) -> ServerStatus {
        match (self.started, self.initialized) {
            (true, true) => ServerStatus::Running,
            (true, false) => ServerStatus::Starting,
            (false, _) => ServerStatus::Stopped,
        }
    }

    /// Observer-facing view shaped by the current status.
    pub fn snapshot(&self) -> StatsSnapshot {
        match self.status() {
            ServerStatus::Running => StatsSnapshot::Running {
                started_at: self.started_at,
                pid: self.pid,
                players: self.players,
            },
            ServerStatus::Starting => StatsSnapshot::Starting,
            ServerStatus::Stopped => StatsSnapshot::Stopped {
                exit_code: self.exit_code,
            },
        }
    }

    /// Merge an update into this struct, only touching fields that are `Some`.
    pub fn merge(&mut self, update: &StatsUpdate) {
        if let Some(started) = update.started {
            self.started = started;
        }
        if let Some(started_at) = update.started_at {
            self.started_at = started_at;
        }
        if let Some(initialized) = update.initialized {
            self.initialized = initialized;
        }
        if let Some(pid) = update.pid {
            self.pid = pid;
        }
        if let Some(players) = update.players {
            self.players = players;
        }
        if let Some(exit_code) = update.exit_code {
            self.exit_code = exit_code;
        }
    }

    /// Return a copy with `update` merged in.
    #[must_use]
    pub fn merged(&self, update: &StatsUpdate) -> Self {
        let mut next = self.clone();
        next.merge(update);
        next
    }
}

/// Partial stats update.
///
/// Nullable fields are `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = set field to null
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsUpdate {
    pub started: Option<bool>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub initialized: Option<bool>,
    pub pid: Option<Option<u32>>,
    pub players: Option<u32>,
    pub exit_code: Option<Option<i32>>,
}

impl StatsUpdate {
    /// Fields recorded when a new process has just been spawned.
    pub const fn launched(started: bool, started_at: DateTime<Utc>, pid: u32) -> Self {
        Self {
            started: Some(started),
            started_at: Some(Some(started_at)),
            initialized: Some(false),
            pid: Some(Some(pid)),
            players: Some(0),
            exit_code: Some(None),
        }
    }

    /// Fields recorded once the process is gone.
    pub const fn exited(started: bool, exit_code: Option<i32>) -> Self {
        Self {
            started: Some(started),
            started_at: Some(None),
            initialized: Some(false),
            pid: Some(None),
            players: Some(0),
            exit_code: Some(exit_code),
        }
    }

    pub const fn initialized() -> Self {
        Self {
            initialized: Some(true),
            ..Self::empty()
        }
    }

    pub const fn players(count: u32) -> Self {
        Self {
            players: Some(count),
            ..Self::empty()
        }
    }

    const fn empty() -> Self {
        Self {
            started: None,
            started_at: None,
            initialized: None,
            pid: None,
            players: None,
            exit_code: None,
        }
    }
}

/// Server lifecycle status as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Process is up and the world has loaded
    Running,
    /// Process is up but the world is still loading
    Starting,
    /// No process (never started, stopped, or crashed)
    Stopped,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Starting => write!(f, "starting"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// The subset of `ServerStats` meaningful to observers.
///
/// Serialized with a `status` tag so the JSON shape matches what the web
/// layer pushes to its clients:
/// `{"status":"running","started_at":...,"pid":...,"players":...}`,
/// `{"status":"starting"}` or `{"status":"stopped","exit_code":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatsSnapshot {
    Running {
        started_at: Option<DateTime<Utc>>,
        pid: Option<u32>,
        players: u32,
    },
    Starting,
    Stopped {
        exit_code: Option<i32>,
    },
}

impl StatsSnapshot {
    pub const fn status(&self) -> ServerStatus {
        match self {
            Self::Running { .. } => ServerStatus::Running,
            Self::Starting => ServerStatus::Starting,
            Self::Stopped { .. } => ServerStatus::Stopped,
        }
    }
}
