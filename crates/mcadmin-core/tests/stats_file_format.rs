//! Contract tests for the `server_stats.json` document.
//!
//! The file is shared with earlier releases of the web admin, so the key
//! names and value shapes are fixed.

use mcadmin_core::{ServerStats, ServerStatus, StatsUpdate};

#[test]
fn test_written_document_is_flat_object() {
    let mut stats = ServerStats::default();
    stats.merge(&StatsUpdate::launched(true, chrono::Utc::now(), 1234));

    let value = serde_json::to_value(&stats).unwrap();
    let obj = value.as_object().expect("stats must be a JSON object");

    assert_eq!(obj["started"], serde_json::json!(true));
    assert!(obj["started_at"].is_string());
    assert_eq!(obj["initialized"], serde_json::json!(false));
    assert_eq!(obj["pid"], serde_json::json!(1234));
    assert_eq!(obj["players"], serde_json::json!(0));
    assert!(obj["exit_code"].is_null());
}

#[test]
fn test_legacy_document_round_trips() {
    let raw = r#"{
        "started": false,
        "started_at": null,
        "initialized": false,
        "pid": null,
        "players": 0,
        "exit_code": 143
    }"#;

    let stats: ServerStats = serde_json::from_str(raw).unwrap();
    assert_eq!(stats.status(), ServerStatus::Stopped);
    assert_eq!(stats.exit_code, Some(143));

    let again: ServerStats =
        serde_json::from_str(&serde_json::to_string(&stats).unwrap()).unwrap();
    assert_eq!(again, stats);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let stats: ServerStats =
        serde_json::from_str(r#"{"started": true, "initialized": true, "motd": "hi"}"#).unwrap();
    assert_eq!(stats.status(), ServerStatus::Running);
}
