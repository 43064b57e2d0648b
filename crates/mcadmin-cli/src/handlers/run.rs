//! Foreground supervisor.
//!
//! Wires a dispatcher and a runner together, prints every republished event
//! and shuts both down on Ctrl-C.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mcadmin_core::{DispatcherSettings, McServerConfig, ServerEvent};
use mcadmin_runtime::{EventDispatcher, RunnerError, ServerRunner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, config: McServerConfig, start: bool) -> Result<()> {
    run_until(ctx, config, start, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C; stopping");
        }
        info!("Interrupt received; shutting down");
    })
    .await?;
    Ok(())
}

/// Run the supervisor until `shutdown` completes.
pub async fn run_until(
    ctx: &CliContext,
    config: McServerConfig,
    start: bool,
    shutdown: impl Future<Output = ()>,
) -> Result<(), CliError> {
    let dispatcher = Arc::new(EventDispatcher::new(DispatcherSettings::default())?);
    let mut events = dispatcher.subscribe(None, 0)?;
    dispatcher.start().await;

    let runner = match ServerRunner::new(
        &ctx.paths.launch_dir,
        config,
        Arc::new(dispatcher.publisher()),
    ) {
        Ok(runner) => Arc::new(runner),
        Err(e) => {
            dispatcher.stop().await;
            return Err(e.into());
        }
    };

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", format_event(&event));
        }
    });

    let cancel = CancellationToken::new();
    let event_loop = tokio::spawn({
        let runner = Arc::clone(&runner);
        let cancel = cancel.clone();
        async move { runner.run(cancel).await }
    });

    let outcome = if start {
        request_start(&runner).await
    } else {
        Ok(())
    };
    if outcome.is_ok() {
        shutdown.await;
    }

    cancel.cancel();
    let finished = match event_loop.await {
        Ok(result) => result.map_err(CliError::from),
        Err(e) => Err(CliError::Runner(format!("Event loop task failed: {e}"))),
    };

    // Stopping the dispatcher closes the subscription, which ends the printer.
    dispatcher.stop().await;
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer task failed");
    }

    outcome.and(finished)
}

async fn request_start(runner: &ServerRunner) -> Result<(), CliError> {
    while !runner.is_running() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    if runner.current_stats().started {
        info!("Saved state says the server runs; it is relaunched by the runner");
        return Ok(());
    }

    match runner.start().await {
        Ok(()) => Ok(()),
        Err(RunnerError::AlreadyRunning) => {
            info!("Server already running");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Console line for one event: log lines verbatim, stats as tagged JSON.
pub fn format_event(event: &ServerEvent) -> String {
    match event {
        ServerEvent::Log(line) => line.clone(),
        ServerEvent::Stats(snapshot) => match serde_json::to_string(snapshot) {
            Ok(json) => format!("[stats] {json}"),
            Err(e) => format!("[stats] <unprintable: {e}>"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::CliPaths;
    use mcadmin_core::{SERVER_STATS_FILE, StatsSnapshot};
    use std::path::Path;

    fn context(root: &Path) -> CliContext {
        CliContext {
            paths: CliPaths::resolve(Some(root), None).unwrap(),
        }
    }

    #[test]
    fn test_format_event() {
        assert_eq!(
            format_event(&ServerEvent::log("[Server thread/INFO]: Done (1.0s)!")),
            "[Server thread/INFO]: Done (1.0s)!"
        );
        assert_eq!(
            format_event(&ServerEvent::Stats(StatsSnapshot::Stopped { exit_code: Some(0) })),
            r#"[stats] {"status":"stopped","exit_code":0}"#
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_without_start_shuts_down_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());

        run_until(&ctx, McServerConfig::default(), false, async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_without_launcher_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        std::fs::create_dir_all(&ctx.paths.launch_dir).unwrap();

        let err = run_until(&ctx, McServerConfig::default(), true, async {})
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)), "{err:?}");
        assert!(!ctx.paths.launch_dir.join(SERVER_STATS_FILE).exists());
    }
}
