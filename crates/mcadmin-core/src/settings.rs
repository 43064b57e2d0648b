//! Settings domain types and validation.
//!
//! These are plain structured config values handed to the runtime by the
//! adapters. Every struct deserializes with `#[serde(default)]` so partial
//! config sources fall back to the same defaults the CLI uses.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default port of the Minecraft RCON listener.
pub const DEFAULT_RCON_PORT: u16 = 25575;

/// Default JVM heap size used for both `-Xms` and `-Xmx`.
pub const DEFAULT_JAVA_MEMORY: &str = "1024M";

/// Minecraft server launch and control configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct McServerConfig {
    /// Java binary handed to the launcher (launcher default when `None`).
    pub java_bin: Option<String>,

    /// Initial heap size, e.g. `1024M`.
    pub java_min_memory: String,

    /// Maximum heap size, e.g. `4G`.
    pub java_max_memory: String,

    /// Extra JVM arguments appended after the heap flags.
    pub server_additional_args: Vec<String>,

    /// RCON connection settings.
    pub rcon: RconSettings,
}

impl Default for McServerConfig {
    fn default() -> Self {
        Self {
            java_bin: None,
            java_min_memory: DEFAULT_JAVA_MEMORY.to_string(),
            java_max_memory: DEFAULT_JAVA_MEMORY.to_string(),
            server_additional_args: Vec::new(),
            rcon: RconSettings::default(),
        }
    }
}

impl McServerConfig {
    /// JVM argument vector: heap flags followed by the extra args.
    pub fn jvm_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-Xms{}", self.java_min_memory),
            format!("-Xmx{}", self.java_max_memory),
        ];
        args.extend(self.server_additional_args.iter().cloned());
        args
    }
}

/// RCON endpoint and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RconSettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub io_timeout_secs: u64,
}

impl Default for RconSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_RCON_PORT,
            connect_timeout_secs: 5,
            io_timeout_secs: 5,
        }
    }
}

impl RconSettings {
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub const fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

/// Fan-out dispatcher sizing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Items kept per topic for scrollback replay.
    pub buffer_size: usize,
    /// Capacity of every subscriber queue.
    pub subscriber_capacity: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            buffer_size: 20,
            subscriber_capacity: 100,
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid JVM memory size '{0}' (expected e.g. 512M, 2G or 1048576)")]
    InvalidMemory(String),

    #[error("RCON port cannot be 0")]
    InvalidRconPort,

    #[error("RCON host cannot be empty")]
    EmptyRconHost,

    #[error("{0} timeout must be at least 1 second")]
    InvalidTimeout(&'static str),

    #[error("Subscriber queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("Buffer size cannot be greater than subscriber queue max size ({capacity}), got {buffer_size}")]
    BufferLargerThanQueue { buffer_size: usize, capacity: usize },
}

/// Validate server configuration values.
pub fn validate_config(config: &McServerConfig) -> Result<(), SettingsError> {
    for memory in [&config.java_min_memory, &config.java_max_memory] {
        if !is_valid_memory_size(memory) {
            return Err(SettingsError::InvalidMemory(memory.clone()));
        }
    }

    if config.rcon.host.trim().is_empty() {
        return Err(SettingsError::EmptyRconHost);
    }

    if config.rcon.port == 0 {
        return Err(SettingsError::InvalidRconPort);
    }

    if config.rcon.connect_timeout_secs == 0 {
        return Err(SettingsError::InvalidTimeout("RCON connect"));
    }

    if config.rcon.io_timeout_secs == 0 {
        return Err(SettingsError::InvalidTimeout("RCON I/O"));
    }

    Ok(())
}

/// Validate dispatcher sizing.
pub const fn validate_dispatcher_settings(
    settings: &DispatcherSettings,
) -> Result<(), SettingsError> {
    if settings.subscriber_capacity == 0 {
        return Err(SettingsError::InvalidQueueCapacity);
    }

    if settings.buffer_size > settings.subscriber_capacity {
        return Err(SettingsError::BufferLargerThanQueue {
            buffer_size: settings.buffer_size,
            capacity: settings.subscriber_capacity,
        });
    }

    Ok(())
}

// Digits with an optional k/m/g suffix, as accepted by -Xms/-Xmx.
fn is_valid_memory_size(value: &str) -> bool {
    let digits = value
        .strip_suffix(['k', 'K', 'm', 'M', 'g', 'G'])
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
