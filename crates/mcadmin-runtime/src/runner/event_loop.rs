//! The runner event loop. Sole owner of the child process.

use chrono::Utc;
use mcadmin_core::StatsUpdate;
use std::future::pending;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{ControlKind, ControlRequest, ServerRunner};
use crate::error::RunnerError;
use crate::process::{LaunchedServer, exit_code, spawn_server, spawn_stdout_reader, stop_child};

/// Process held by the loop, with its console and stdout reader.
struct Supervised {
    child: Child,
    pid: u32,
    console: ChildStdin,
    reader: JoinHandle<()>,
}

/// How the persisted `started` flag is treated on a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    /// Operator request: `started` follows the transition.
    Requested,
    /// Runner bootstrap or shutdown: `started` keeps its persisted value.
    KeepPersisted,
}

pub(super) struct EventLoop<'a> {
    runner: &'a ServerRunner,
    process: Option<Supervised>,
}

impl<'a> EventLoop<'a> {
    pub(super) const fn new(runner: &'a ServerRunner) -> Self {
        Self {
            runner,
            process: None,
        }
    }

    pub(super) async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<ControlRequest>,
        cancel: CancellationToken,
    ) {
        let runner = self.runner;
        runner.store.publish_current();

        if runner.store.current().started {
            info!("Server was started before the runner went down; relaunching");
            if let Err(e) = self.launch(Intent::KeepPersisted).await {
                error!(error = %e, "Failed to relaunch server on startup");
                // No process backs the persisted pid any more.
                if let Err(e) = runner.store.apply(StatsUpdate::exited(false, None)).await {
                    error!(error = %e, "Failed to reset server stats");
                }
            }
        }

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    if self.process.is_some() {
                        if let Err(e) = self.shutdown(Intent::KeepPersisted).await {
                            error!(error = %e, "Failed to stop server during runner shutdown");
                        }
                    }
                    break;
                }

                status = wait_for_exit(&mut self.process) => {
                    self.on_unexpected_exit(status, &mut requests).await;
                }

                request = requests.recv() => {
                    // The runner keeps a sender alive, so `None` never happens
                    // while `self.runner` is borrowed.
                    let Some(request) = request else { break };
                    self.handle(request).await;
                }
            }
        }
    }

    async fn handle(&mut self, request: ControlRequest) {
        let kind = request.kind;
        debug!(%kind, "Handling control request");

        let result = match kind {
            ControlKind::Start => self.launch(Intent::Requested).await,
            ControlKind::Stop => self.shutdown(Intent::Requested).await,
            ControlKind::Restart => self.restart().await,
        };

        if let Err(e) = &result {
            warn!(%kind, error = %e, "Control request failed");
        }
        request.resolve(result);
    }

    async fn launch(&mut self, intent: Intent) -> Result<(), RunnerError> {
        if self.process.is_some() {
            return Err(RunnerError::AlreadyRunning);
        }

        let runner = self.runner;
        info!("Starting Minecraft server");
        let LaunchedServer {
            mut child,
            pid,
            stdin,
            stdout,
        } = spawn_server(&runner.launch_dir, &runner.config)?;

        let started = match intent {
            Intent::Requested => true,
            Intent::KeepPersisted => runner.store.current().started,
        };

        // Recorded before the reader exists, so no log-derived update can
        // land on the previous process's stats.
        if let Err(e) = runner
            .store
            .apply(StatsUpdate::launched(started, Utc::now(), pid))
            .await
        {
            error!(pid, error = %e, "Could not record launch; killing server");
            if let Err(kill_err) = child.start_kill() {
                debug!(error = %kill_err, "Kill failed");
            }
            if let Err(wait_err) = child.wait().await {
                debug!(error = %wait_err, "Reaping killed server failed");
            }
            return Err(e);
        }

        let reader = spawn_stdout_reader(
            stdout,
            pid,
            Arc::clone(&runner.store),
            Arc::clone(&runner.sink),
        );
        self.process = Some(Supervised {
            child,
            pid,
            console: stdin,
            reader,
        });

        info!(pid, "Minecraft server started");
        Ok(())
    }

    async fn shutdown(&mut self, intent: Intent) -> Result<(), RunnerError> {
        let Some(mut process) = self.process.take() else {
            return Err(RunnerError::NotRunning);
        };
        let runner = self.runner;

        let code = match stop_child(
            &mut process.child,
            Some(&mut process.console),
            runner.timeouts.graceful_stop,
        )
        .await
        {
            Ok(status) => exit_code(status),
            Err(e) => {
                error!(pid = process.pid, error = %e, "Failed to reap server process");
                None
            }
        };
        self.drain_reader(process.reader).await;

        let started = match intent {
            Intent::Requested => false,
            Intent::KeepPersisted => runner.store.current().started,
        };
        runner
            .store
            .apply(StatsUpdate::exited(started, code))
            .await?;

        info!(code = ?code, "Minecraft server stopped");
        Ok(())
    }

    async fn restart(&mut self) -> Result<(), RunnerError> {
        if self.process.is_some() {
            self.shutdown(Intent::Requested).await?;
        }
        self.launch(Intent::Requested).await
    }

    async fn on_unexpected_exit(
        &mut self,
        status: io::Result<ExitStatus>,
        requests: &mut mpsc::UnboundedReceiver<ControlRequest>,
    ) {
        let Some(process) = self.process.take() else {
            return;
        };

        let code = match status {
            Ok(status) => exit_code(status),
            Err(e) => {
                error!(pid = process.pid, error = %e, "Failed to wait on server process");
                None
            }
        };
        warn!(pid = process.pid, code = ?code, "Minecraft server exited unexpectedly");

        // Requests queued before the exit was noticed were aimed at a
        // process that no longer exists.
        let mut stale = Vec::new();
        while let Ok(request) = requests.try_recv() {
            stale.push(request);
        }

        self.drain_reader(process.reader).await;

        if let Err(e) = self
            .runner
            .store
            .apply(StatsUpdate::exited(false, code))
            .await
        {
            error!(error = %e, "Failed to record server exit");
        }

        for request in stale {
            debug!(kind = %request.kind, "Failing request queued before exit");
            request.resolve(Err(RunnerError::ExitedUnexpectedly { code }));
        }
    }

    /// Let the reader finish the buffered output, then abort it.
    async fn drain_reader(&self, mut reader: JoinHandle<()>) {
        if timeout(self.runner.timeouts.reader_drain, &mut reader)
            .await
            .is_err()
        {
            debug!("stdout reader still busy after exit; aborting");
            reader.abort();
            let _ = reader.await;
        }
    }
}

async fn wait_for_exit(process: &mut Option<Supervised>) -> io::Result<ExitStatus> {
    match process {
        Some(process) => process.child.wait().await,
        None => pending().await,
    }
}
