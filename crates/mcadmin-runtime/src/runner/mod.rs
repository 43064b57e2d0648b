//! Minecraft server supervisor.
//!
//! [`ServerRunner`] owns at most one server process. Callers never touch the
//! process directly: `start`/`stop`/`restart` enqueue a control request that
//! a single event loop ([`ServerRunner::run`]) consumes, racing requests
//! against the process exiting on its own. Reads (`status`, `stats`) come
//! straight from the stats store and never wait on the loop.

mod control;
mod event_loop;

pub use control::ControlKind;
pub(crate) use control::ControlRequest;

use mcadmin_core::{McServerConfig, ServerEventSink, ServerStats, ServerStatus, StatsSnapshot};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::RunnerError;
use crate::stats_store::StatsStore;
use event_loop::EventLoop;

/// Timeouts used by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerTimeouts {
    /// How long a caller waits for a control request to be handled.
    pub control: Duration,
    /// How long the server gets to honour the console `stop` before SIGTERM.
    pub graceful_stop: Duration,
    /// How long the stdout reader may keep draining after the process exits.
    pub reader_drain: Duration,
}

impl Default for RunnerTimeouts {
    fn default() -> Self {
        Self {
            control: Duration::from_secs(60),
            graceful_stop: Duration::from_secs(30),
            reader_drain: Duration::from_secs(2),
        }
    }
}

/// Supervisor for the server in one launch directory.
pub struct ServerRunner {
    launch_dir: PathBuf,
    config: McServerConfig,
    timeouts: RunnerTimeouts,
    store: Arc<StatsStore>,
    sink: Arc<dyn ServerEventSink>,
    control_tx: mpsc::UnboundedSender<ControlRequest>,
    control_rx: Mutex<Option<mpsc::UnboundedReceiver<ControlRequest>>>,
    loop_active: AtomicBool,
}

impl std::fmt::Debug for ServerRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRunner")
            .field("launch_dir", &self.launch_dir)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl ServerRunner {
    /// Create a runner and load the persisted stats of `launch_dir`.
    pub fn new(
        launch_dir: impl Into<PathBuf>,
        config: McServerConfig,
        sink: Arc<dyn ServerEventSink>,
    ) -> Result<Self, RunnerError> {
        let launch_dir = launch_dir.into();
        let store = Arc::new(StatsStore::load(&launch_dir, Arc::clone(&sink))?);
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        Ok(Self {
            launch_dir,
            config,
            timeouts: RunnerTimeouts::default(),
            store,
            sink,
            control_tx,
            control_rx: Mutex::new(Some(control_rx)),
            loop_active: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: RunnerTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn launch_dir(&self) -> &Path {
        &self.launch_dir
    }

    pub const fn config(&self) -> &McServerConfig {
        &self.config
    }

    /// Start the server.
    pub async fn start(&self) -> Result<(), RunnerError> {
        self.request(ControlKind::Start).await
    }

    /// Stop the server: console `stop`, then SIGTERM after the grace period.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        self.request(ControlKind::Stop).await
    }

    /// Stop (if running) and start again, with no other request in between.
    pub async fn restart(&self) -> Result<(), RunnerError> {
        self.request(ControlKind::Restart).await
    }

    /// Whether the event loop is currently accepting requests.
    pub fn is_running(&self) -> bool {
        self.loop_active.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ServerStatus {
        self.store.status()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.store.snapshot()
    }

    /// Full stats record, including fields the snapshot hides.
    pub fn current_stats(&self) -> ServerStats {
        self.store.current()
    }

    /// Receiver updated on every stats change.
    pub fn subscribe_state(&self) -> watch::Receiver<ServerStats> {
        self.store.subscribe()
    }

    /// Run the event loop until `cancel` fires.
    ///
    /// If the persisted stats say the server was started, it is launched
    /// again first. On cancellation a running server is stopped gracefully
    /// while the persisted `started` flag is kept, so the next runner
    /// relaunches it.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RunnerError> {
        let rx = self
            .control_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RunnerError::AlreadyStarted)?;

        self.loop_active.store(true, Ordering::SeqCst);
        info!(launch_dir = %self.launch_dir.display(), "Server runner started");

        EventLoop::new(self).run(rx, cancel).await;

        self.loop_active.store(false, Ordering::SeqCst);
        info!("Server runner stopped");
        Ok(())
    }

    async fn request(&self, kind: ControlKind) -> Result<(), RunnerError> {
        if !self.is_running() {
            return Err(RunnerError::Unavailable);
        }

        let (reply, response) = oneshot::channel();
        self.control_tx
            .send(ControlRequest { kind, reply })
            .map_err(|_| RunnerError::Unavailable)?;

        match timeout(self.timeouts.control, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RunnerError::Dropped),
            Err(_) => Err(RunnerError::Timeout { kind }),
        }
    }
}
