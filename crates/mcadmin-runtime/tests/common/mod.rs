//! Shared harness for runner integration tests.
//!
//! Each harness gets its own launch directory with a shell-script launcher
//! standing in for `mcadmin-start.sh`, a started dispatcher, and a runner
//! event loop spawned on the test runtime.

#![allow(dead_code)]

use mcadmin_core::{
    DispatcherSettings, McServerConfig, SERVER_STATS_FILE, ServerEventSink, ServerStats,
    ServerStatus, launch_dir,
};
use mcadmin_runtime::{EventDispatcher, RunnerError, RunnerTimeouts, ServerRunner};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Prints the ready line, then serves console commands until `stop`.
pub const WELL_BEHAVED: &str = r#"#!/bin/sh
echo "[Server thread/INFO]: Starting minecraft server (arg: $1)"
echo "[Server thread/INFO]: jvm args: $MCADMIN_RUNTIME_JVM_ARGS"
echo "[Server thread/INFO]: Done (1.234s)! For help, type \"help\""
while read -r line; do
    case "$line" in
        stop) echo "[Server thread/INFO]: Stopping server"; exit 0 ;;
        *) echo "[Server thread/INFO]: Unknown command: $line" ;;
    esac
done
"#;

/// Loads, reports players coming and going, then waits for `stop`.
pub const WITH_PLAYERS: &str = r#"#!/bin/sh
echo "[Server thread/INFO]: Done (0.500s)! For help, type \"help\""
echo "[Server thread/INFO]: Alex joined the game"
echo "[Server thread/INFO]: Steve joined the game"
echo "[Server thread/INFO]: Alex left the game"
while read -r line; do
    [ "$line" = stop ] && exit 0
done
"#;

/// Loads, then dies on its own with exit code 7.
pub const CRASHING: &str = r#"#!/bin/sh
echo "[Server thread/INFO]: Done (0.100s)! For help, type \"help\""
sleep 0.3
echo "[Server thread/ERROR]: Encountered an unexpected exception"
exit 7
"#;

/// Keeps running when the console hits EOF; only `stop` ends it.
pub const STOP_ONLY: &str = r#"#!/bin/sh
echo "[Server thread/INFO]: Done (0.200s)! For help, type \"help\""
while true; do
    if read -r line; then
        [ "$line" = stop ] && exit 0
    else
        echo "[Server thread/WARN]: console closed"
        sleep 0.2
    fi
done
"#;

/// Loads, then ignores the console entirely.
pub const STUBBORN: &str = r#"#!/bin/sh
echo "[Server thread/INFO]: Done (0.100s)! For help, type \"help\""
while true; do sleep 0.1; done
"#;

pub fn fast_timeouts() -> RunnerTimeouts {
    RunnerTimeouts {
        control: Duration::from_secs(20),
        graceful_stop: Duration::from_secs(5),
        reader_drain: Duration::from_millis(500),
    }
}

pub struct Harness {
    _tmp: TempDir,
    pub launch_dir: PathBuf,
    pub runner: Arc<ServerRunner>,
    pub dispatcher: Arc<EventDispatcher>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), RunnerError>>>,
}

impl Harness {
    /// Harness whose launcher runs `script`.
    pub async fn new(script: &str) -> Self {
        Self::with(Some(script), None, fast_timeouts()).await
    }

    /// Full control: optional launcher, optional pre-existing stats file.
    pub async fn with(
        script: Option<&str>,
        persisted: Option<&ServerStats>,
        timeouts: RunnerTimeouts,
    ) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let dir = launch_dir(tmp.path());
        std::fs::create_dir_all(&dir).unwrap();

        if let Some(script) = script {
            write_launcher(&dir, script);
        }
        if let Some(stats) = persisted {
            std::fs::write(
                dir.join(SERVER_STATS_FILE),
                serde_json::to_vec(stats).unwrap(),
            )
            .unwrap();
        }

        let dispatcher = Arc::new(EventDispatcher::new(DispatcherSettings::default()).unwrap());
        dispatcher.start().await;
        let sink: Arc<dyn ServerEventSink> = Arc::new(dispatcher.publisher());

        let runner = Arc::new(
            ServerRunner::new(&dir, McServerConfig::default(), sink)
                .unwrap()
                .with_timeouts(timeouts),
        );

        let mut harness = Self {
            _tmp: tmp,
            launch_dir: dir,
            runner,
            dispatcher,
            cancel: CancellationToken::new(),
            task: None,
        };
        harness.spawn_loop().await;
        harness
    }

    async fn spawn_loop(&mut self) {
        let runner = Arc::clone(&self.runner);
        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(async move { runner.run(cancel).await }));

        // Requests sent before the loop is up are rejected.
        while !self.runner.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Cancel the loop and wait for its graceful shutdown.
    pub async fn shutdown(mut self) -> (PathBuf, TempDir) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await.unwrap().unwrap();
        }
        self.dispatcher.stop().await;
        (self.launch_dir, self._tmp)
    }

    pub async fn wait_for_status(&self, want: ServerStatus) -> ServerStats {
        self.wait_for(|stats| stats.status() == want).await
    }

    pub async fn wait_for(&self, mut done: impl FnMut(&ServerStats) -> bool) -> ServerStats {
        let mut rx = self.runner.subscribe_state();
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let stats = rx.borrow_and_update().clone();
                if done(&stats) {
                    return stats;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("timed out waiting for server stats")
    }
}

pub fn write_launcher(dir: &Path, script: &str) {
    let path = dir.join(mcadmin_core::LAUNCHER_SCRIPT);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn read_persisted(dir: &Path) -> ServerStats {
    serde_json::from_slice(&std::fs::read(dir.join(SERVER_STATS_FILE)).unwrap()).unwrap()
}
