//! Spawning the server through the instance launcher script.

use mcadmin_core::{LAUNCHER_SCRIPT, McServerConfig};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::RunnerError;

/// Shell-quoted JVM arguments read by the launcher.
pub const JVM_ARGS_ENV: &str = "MCADMIN_RUNTIME_JVM_ARGS";

/// Java binary override read by the launcher.
pub const JAVA_BIN_ENV: &str = "MCADMIN_RUNTIME_JAVA_BIN";

/// A freshly spawned server process.
///
/// The console pipes are taken out of `child`: `Child::wait` closes a stdin
/// it still holds, which would hand the server an EOF on its console.
#[derive(Debug)]
pub struct LaunchedServer {
    pub child: Child,
    pub pid: u32,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

pub fn launcher_path(launch_dir: &Path) -> PathBuf {
    launch_dir.join(LAUNCHER_SCRIPT)
}

/// Build the launcher invocation: `./mcadmin-start.sh nogui` run from the
/// launch directory in its own process group, stdin/stdout piped and stderr
/// discarded.
pub fn build_command(launch_dir: &Path, config: &McServerConfig) -> Command {
    let mut cmd = Command::new(launcher_path(launch_dir));
    cmd.arg("nogui")
        .current_dir(launch_dir)
        .env(JVM_ARGS_ENV, shell_join(&config.jvm_args()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(false);

    if let Some(java_bin) = config.java_bin.as_deref().filter(|b| !b.trim().is_empty()) {
        cmd.env(JAVA_BIN_ENV, java_bin);
    }

    // Own process group so terminal signals aimed at us do not reach the
    // server, and so shutdown can signal the launcher and the JVM together.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}

/// Check preconditions and spawn the server.
pub fn spawn_server(launch_dir: &Path, config: &McServerConfig) -> Result<LaunchedServer, RunnerError> {
    if !launch_dir.is_dir() {
        return Err(RunnerError::LaunchDirMissing(launch_dir.to_path_buf()));
    }

    let launcher = launcher_path(launch_dir);
    if !launcher.is_file() {
        return Err(RunnerError::LauncherMissing(launcher));
    }

    debug!(launcher = %launcher.display(), jvm_args = ?config.jvm_args(), "Spawning server");
    let mut child = build_command(launch_dir, config)
        .spawn()
        .map_err(|e| RunnerError::Spawn(format!("{}: {e}", launcher.display())))?;

    let pid = child
        .id()
        .ok_or_else(|| RunnerError::Spawn("process exited before reporting a PID".to_string()))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| RunnerError::Spawn("stdin was not captured".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RunnerError::Spawn("stdout was not captured".to_string()))?;

    info!(pid, "Minecraft server process spawned");
    Ok(LaunchedServer {
        child,
        pid,
        stdin,
        stdout,
    })
}

/// Join arguments into one POSIX shell string, quoting where needed.
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c);
    if !arg.is_empty() && arg.chars().all(is_safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}
