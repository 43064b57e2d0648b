//! Durable, observable server stats.
//!
//! `StatsStore` is the only writer of `server_stats.json`. Every mutation
//! goes through [`StatsStore::apply_with`], which merges the update into a
//! copy, writes the whole document atomically (temp file + rename), swaps the
//! in-memory value and publishes a `Stats` event. Readers never wait on a
//! writer: they borrow the latest value from a `watch` channel.

use mcadmin_core::{
    SERVER_STATS_FILE, ServerEvent, ServerEventSink, ServerStats, ServerStatus, StatsSnapshot,
    StatsUpdate,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::error::RunnerError;

/// Persisted stats for one launch directory.
pub struct StatsStore {
    launch_dir: PathBuf,
    path: PathBuf,
    state: watch::Sender<ServerStats>,
    write_lock: Mutex<()>,
    sink: Arc<dyn ServerEventSink>,
}

impl std::fmt::Debug for StatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsStore")
            .field("path", &self.path)
            .field("stats", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl StatsStore {
    /// Load `server_stats.json` from `launch_dir`.
    ///
    /// An absent file (or an absent launch directory) yields default stats.
    /// A file that exists but cannot be parsed is an error.
    pub fn load(
        launch_dir: impl Into<PathBuf>,
        sink: Arc<dyn ServerEventSink>,
    ) -> Result<Self, RunnerError> {
        let launch_dir = launch_dir.into();
        let path = launch_dir.join(SERVER_STATS_FILE);
        let stats = read_stats(&path)?;
        debug!(path = %path.display(), status = %stats.status(), "Loaded server stats");

        let (state, _) = watch::channel(stats);
        Ok(Self {
            launch_dir,
            path,
            state,
            write_lock: Mutex::new(()),
            sink,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn launch_dir(&self) -> &Path {
        &self.launch_dir
    }

    /// Latest stats value.
    pub fn current(&self) -> ServerStats {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ServerStatus {
        self.state.borrow().status()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.state.borrow().snapshot()
    }

    /// Receiver that observes every stats replacement.
    pub fn subscribe(&self) -> watch::Receiver<ServerStats> {
        self.state.subscribe()
    }

    /// Publish the current snapshot without changing anything.
    pub fn publish_current(&self) {
        self.sink.publish(ServerEvent::Stats(self.snapshot()));
    }

    /// Merge `update`, persist and publish.
    pub async fn apply(&self, update: StatsUpdate) -> Result<ServerStats, RunnerError> {
        self.apply_with(|_| update).await
    }

    /// Compute an update from the current value and apply it, all under the
    /// write lock, so read-modify-write updates never lose increments.
    pub async fn apply_with<F>(&self, compute: F) -> Result<ServerStats, RunnerError>
    where
        F: FnOnce(&ServerStats) -> StatsUpdate,
    {
        let _guard = self.write_lock.lock().await;

        if !is_dir(&self.launch_dir).await {
            return Err(RunnerError::LaunchDirMissing(self.launch_dir.clone()));
        }

        let current = self.current();
        let next = current.merged(&compute(&current));

        let body =
            serde_json::to_vec_pretty(&next).map_err(|e| RunnerError::Persist(e.to_string()))?;
        self.write_atomic(&body)
            .await
            .map_err(|e| RunnerError::Persist(format!("{}: {e}", self.path.display())))?;

        self.state.send_replace(next.clone());
        self.sink.publish(ServerEvent::Stats(next.snapshot()));
        Ok(next)
    }

    async fn write_atomic(&self, body: &[u8]) -> io::Result<()> {
        let temp_path = self.launch_dir.join(format!("{SERVER_STATS_FILE}.tmp"));
        tokio::fs::write(&temp_path, body).await?;
        tokio::fs::rename(&temp_path, &self.path).await
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

fn read_stats(path: &Path) -> Result<ServerStats, RunnerError> {
    let load_error = |reason: String| RunnerError::LoadStats {
        path: path.to_path_buf(),
        reason,
    };

    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| load_error(e.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ServerStats::default()),
        Err(e) => Err(load_error(e.to_string())),
    }
}
