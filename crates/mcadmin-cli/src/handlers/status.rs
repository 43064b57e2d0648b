//! Status command handler.
//!
//! Reads `server_stats.json` straight from disk; no runner needs to be up.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use mcadmin_core::NoopEventSink;
use mcadmin_runtime::StatsStore;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", render(&ctx.paths.launch_dir)?);
    Ok(())
}

/// Snapshot of the saved stats as pretty-printed JSON.
pub fn render(launch_dir: &Path) -> Result<String, CliError> {
    let store = StatsStore::load(launch_dir, Arc::new(NoopEventSink))?;
    serde_json::to_string_pretty(&store.snapshot()).map_err(|e| CliError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcadmin_core::SERVER_STATS_FILE;

    #[test]
    fn test_missing_file_reads_as_stopped() {
        let tmp = tempfile::tempdir().unwrap();
        let json: serde_json::Value = serde_json::from_str(&render(tmp.path()).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "stopped", "exit_code": null})
        );
    }

    #[test]
    fn test_running_server_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(SERVER_STATS_FILE),
            r#"{"started": true, "started_at": "2026-10-16T08:00:00Z", "initialized": true, "pid": 4242, "players": 3, "exit_code": null}"#,
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&render(tmp.path()).unwrap()).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["pid"], 4242);
        assert_eq!(json["players"], 3);
    }

    #[test]
    fn test_corrupt_file_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SERVER_STATS_FILE), "{not json").unwrap();
        assert!(matches!(render(tmp.path()), Err(CliError::Io(_))));
    }
}
