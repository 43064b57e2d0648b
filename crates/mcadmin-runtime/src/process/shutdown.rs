//! Graceful shutdown of the server process: console `stop`, then SIGTERM.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Console command that makes the server save and exit.
const STOP_COMMAND: &[u8] = b"stop\n";

/// Stop the server and reap it.
///
/// `console` is the server's stdin, kept open by the caller for the life of
/// the process.
///
/// # Strategy
/// 1. Write `stop` to the server console and wait up to `grace`
/// 2. If still running, send SIGTERM to its process group
/// 3. Wait for the exit without a bound (the world may still be saving)
pub async fn stop_child(
    child: &mut Child,
    console: Option<&mut ChildStdin>,
    grace: Duration,
) -> io::Result<ExitStatus> {
    info!("Sending stop command to Minecraft server");
    if let Err(e) = send_stop_command(console).await {
        // The console is gone when the server is already on its way out.
        debug!(error = %e, "Could not write stop command");
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    warn!(grace_secs = grace.as_secs(), "Graceful stop timed out; terminating server");
    terminate(child)?;
    child.wait().await
}

async fn send_stop_command(console: Option<&mut ChildStdin>) -> io::Result<()> {
    let Some(stdin) = console else {
        return Err(io::Error::new(io::ErrorKind::BrokenPipe, "console not available"));
    };
    stdin.write_all(STOP_COMMAND).await?;
    stdin.flush().await
}

#[cfg(unix)]
fn terminate(child: &Child) -> io::Result<()> {
    // Already reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pgid = i32::try_from(pid).map_err(io::Error::other)?;

    match signal::killpg(Pid::from_raw(pgid), Signal::SIGTERM) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> io::Result<()> {
    // No SIGTERM equivalent
    child.start_kill()
}

/// Exit code of a finished process; `-signal` when killed by a signal.
pub fn exit_code(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().or_else(|| status.signal().map(|sig| -sig))
    }

    #[cfg(not(unix))]
    {
        status.code()
    }
}
