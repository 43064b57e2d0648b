//! Server stdout reader (non-UTF8-safe).
//!
//! Modded servers and their launchers can print arbitrary bytes, and
//! `BufReader::lines()` stops at the first invalid UTF-8 sequence. Lines are
//! read as bytes and decoded lossily so the stream keeps flowing.

use mcadmin_core::{ServerEvent, ServerEventSink};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::log_parser::{LogSignal, classify};
use crate::stats_store::StatsStore;

/// Spawn the task that classifies and republishes every stdout line until EOF.
pub fn spawn_stdout_reader(
    stdout: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    store: Arc<StatsStore>,
    sink: Arc<dyn ServerEventSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    handle_line(line, &store, sink.as_ref()).await;
                }
                Err(e) => {
                    debug!(pid, error = %e, "stdout reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(pid, "stdout reader task exiting");
    })
}

async fn handle_line(line: String, store: &StatsStore, sink: &dyn ServerEventSink) {
    debug!("MC log: {line}");

    if let Some(signal) = classify(&line) {
        match signal {
            LogSignal::Initialized => info!("Minecraft server ready"),
            LogSignal::PlayerJoined => info!("Player joined the game"),
            LogSignal::PlayerLeft => info!("Player left the game"),
            LogSignal::PlayerCount(count) => info!(count, "Player count updated"),
        }
        if let Err(e) = store.apply_with(|stats| signal.update_for(stats)).await {
            warn!(error = %e, "Failed to record log signal");
        }
    }

    sink.publish(ServerEvent::Log(line));
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcadmin_core::{NoopEventSink, ServerStatus, StatsUpdate, Topic};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ServerEvent>>);

    impl ServerEventSink for RecordingSink {
        fn publish(&self, event: ServerEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_lines_are_classified_and_republished() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(StatsStore::load(tmp.path(), Arc::new(NoopEventSink)).unwrap());
        store
            .apply(StatsUpdate::launched(true, chrono::Utc::now(), 1))
            .await
            .unwrap();

        let output: &[u8] = b"Starting\r\nDone (3.210s)! For help\nAlex joined the game\n\xffbad\xfe bytes";
        let sink = Arc::new(RecordingSink::default());
        spawn_stdout_reader(output, 1, Arc::clone(&store), sink.clone())
            .await
            .unwrap();

        let stats = store.current();
        assert_eq!(stats.status(), ServerStatus::Running);
        assert_eq!(stats.players, 1);

        let events = sink.0.lock().unwrap();
        let logs: Vec<_> = events
            .iter()
            .filter(|e| e.topic() == Topic::Logs)
            .cloned()
            .collect();
        assert_eq!(logs.len(), 4);
        assert_eq!(logs[0], ServerEvent::log("Starting"));
        assert_eq!(logs[2], ServerEvent::log("Alex joined the game"));
        assert_eq!(logs[3], ServerEvent::log("\u{fffd}bad\u{fffd} bytes"));
    }
}
