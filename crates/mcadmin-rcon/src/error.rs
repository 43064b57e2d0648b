//! RCON client errors.

use std::io;
use thiserror::Error;

/// Errors surfaced by the RCON client.
#[derive(Debug, Error)]
pub enum RconError {
    /// The TCP connection could not be established.
    #[error("RCON server not reachable: {0}")]
    Unreachable(String),

    /// The server rejected the password.
    #[error("RCON authentication failed")]
    Auth,

    /// The connection dropped mid-exchange (reset, broken pipe, short read).
    #[error("RCON connection lost: {0}")]
    ConnectionLost(String),

    /// A read or write did not complete within the I/O timeout.
    #[error("RCON {0} timed out")]
    Timeout(&'static str),

    /// The server sent bytes that do not form a valid packet.
    #[error("Malformed RCON packet: {0}")]
    Malformed(String),

    /// Any other socket error.
    #[error("RCON I/O error: {0}")]
    Io(io::Error),

    /// Every attempt of a retried command failed.
    #[error("RCON command failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl RconError {
    /// Whether a fresh connection may succeed where this one failed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionLost(_) | Self::Timeout(_))
    }
}

impl From<io::Error> for RconError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::ConnectionLost(err.to_string()),
            _ => Self::Io(err),
        }
    }
}
