//! Control requests handed from callers to the runner event loop.

use std::fmt;
use tokio::sync::oneshot;

use crate::error::RunnerError;

/// Lifecycle operation requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Start,
    Stop,
    Restart,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
            Self::Restart => write!(f, "restart"),
        }
    }
}

/// One queued request and the channel its outcome is sent back on.
#[derive(Debug)]
pub(crate) struct ControlRequest {
    pub kind: ControlKind,
    pub reply: oneshot::Sender<Result<(), RunnerError>>,
}

impl ControlRequest {
    /// Resolve the request. The caller may have stopped waiting.
    pub fn resolve(self, result: Result<(), RunnerError>) {
        let _ = self.reply.send(result);
    }
}
