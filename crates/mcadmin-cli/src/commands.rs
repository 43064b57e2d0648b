//! Subcommands and their shared argument groups.

use clap::{Args, Subcommand};
use mcadmin_core::settings::DEFAULT_JAVA_MEMORY;
use mcadmin_core::{McServerConfig, RconSettings, validate_config};
use mcadmin_rcon::DEFAULT_RETRIES;

use crate::error::CliError;

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the supervisor in the foreground, streaming logs and stats
    Run {
        /// Start the server unless the saved state already says it runs
        #[arg(long)]
        start: bool,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Print the saved server state as JSON
    Status,

    /// Send one command over RCON and print the reply
    Rcon {
        #[command(flatten)]
        rcon: RconArgs,

        /// Command words, joined with spaces (e.g. `say hello`)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Interactive RCON prompt
    Console {
        #[command(flatten)]
        rcon: RconArgs,
    },

    /// Show resolved data root and launch directory
    Paths,
}

/// JVM settings handed to the launcher script.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Java binary the launcher should use
    #[arg(long = "java-bin", env = "MCADMIN_JAVA_BIN")]
    pub java_bin: Option<String>,

    /// Initial heap size (-Xms)
    #[arg(long = "min-memory", env = "MCADMIN_JAVA_MIN_MEMORY", default_value = DEFAULT_JAVA_MEMORY)]
    pub min_memory: String,

    /// Maximum heap size (-Xmx)
    #[arg(long = "max-memory", env = "MCADMIN_JAVA_MAX_MEMORY", default_value = DEFAULT_JAVA_MEMORY)]
    pub max_memory: String,

    /// Extra JVM argument, repeatable
    #[arg(long = "jvm-arg", allow_hyphen_values = true)]
    pub jvm_args: Vec<String>,
}

impl ServerArgs {
    /// Build and validate the server configuration.
    pub fn to_config(&self) -> Result<McServerConfig, CliError> {
        let config = McServerConfig {
            java_bin: self.java_bin.clone().filter(|bin| !bin.trim().is_empty()),
            java_min_memory: self.min_memory.clone(),
            java_max_memory: self.max_memory.clone(),
            server_additional_args: self.jvm_args.clone(),
            ..McServerConfig::default()
        };
        validate_config(&config)?;
        Ok(config)
    }
}

/// RCON endpoint and credentials.
#[derive(Debug, Clone, Args)]
pub struct RconArgs {
    /// RCON password
    #[arg(long, env = "MCADMIN_RCON_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,

    /// RCON host
    #[arg(long = "rcon-host", env = "MCADMIN_RCON_HOST")]
    pub host: Option<String>,

    /// RCON port
    #[arg(long = "rcon-port", env = "MCADMIN_RCON_PORT")]
    pub port: Option<u16>,

    /// Attempts made when the connection drops or times out
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retry: u32,
}

impl RconArgs {
    pub fn settings(&self) -> RconSettings {
        let defaults = RconSettings::default();
        RconSettings {
            host: self.host.clone().unwrap_or_else(|| defaults.host.clone()),
            port: self.port.unwrap_or(defaults.port),
            ..defaults
        }
    }
}
