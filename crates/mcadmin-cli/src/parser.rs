//! Main CLI parser and top-level argument handling.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Supervise a Minecraft server from the command line.
#[derive(Debug, Parser)]
#[command(name = "mcadmin")]
#[command(about = "Supervise a Minecraft server and talk to it over RCON")]
#[command(version)]
pub struct Cli {
    /// Override the data root (defaults to the platform data dir)
    #[arg(long = "data-dir", global = true, env = "MCADMIN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the launch directory (defaults to <data-dir>/mc/current)
    #[arg(long = "launch-dir", global = true, env = "MCADMIN_LAUNCH_DIR")]
    pub launch_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Also write logs to a daily-rotated file in this directory
    #[arg(long = "log-dir", global = true, env = "MCADMIN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "mcadmin",
            "--verbose",
            "--data-dir",
            "/srv/mcadmin",
            "--log-dir",
            "/var/log/mcadmin",
            "paths",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/mcadmin")));
        assert_eq!(cli.log_dir, Some(PathBuf::from("/var/log/mcadmin")));
        assert!(matches!(cli.command, Some(Commands::Paths)));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["mcadmin", "status", "--launch-dir", "/srv/mc", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.launch_dir, Some(PathBuf::from("/srv/mc")));
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::parse_from(["mcadmin"]);
        assert!(cli.command.is_none());
    }
}
