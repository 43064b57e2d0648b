//! Core domain types and port definitions for mcadmin.
//!
//! This crate holds the pure, infrastructure-free half of the Minecraft
//! server supervisor: the persisted server stats and their derived status,
//! the events republished to observers, the event sink port implemented by
//! the runtime dispatcher, and the settings/paths the adapters resolve.
#![deny(unused_crate_dependencies)]

pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;
pub mod stats;

// Re-export commonly used types for convenience
pub use events::{ServerEvent, Topic};
pub use paths::{
    LAUNCHER_SCRIPT, PathError, SERVER_STATS_FILE, data_root, ensure_directory, launch_dir,
    resolve_data_root,
};
pub use ports::{NoopEventSink, ServerEventSink};
pub use settings::{
    DEFAULT_RCON_PORT, DispatcherSettings, McServerConfig, RconSettings, SettingsError,
    validate_config, validate_dispatcher_settings,
};
pub use stats::{ServerStats, ServerStatus, StatsSnapshot, StatsUpdate};
