//! Events republished by the runner to live observers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::StatsSnapshot;

/// Topic an event is published under.
///
/// Subscribers filter on the topic; the dispatcher keeps one scrollback
/// buffer per topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Logs,
    Stats,
}

impl Topic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logs => "logs",
            Self::Stats => "stats",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server event payload.
///
/// `Log` carries one decoded stdout line verbatim, `Stats` a snapshot taken
/// right after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerEvent {
    Log(String),
    Stats(StatsSnapshot),
}

impl ServerEvent {
    pub fn log(line: impl Into<String>) -> Self {
        Self::Log(line.into())
    }

    pub const fn topic(&self) -> Topic {
        match self {
            Self::Log(_) => Topic::Logs,
            Self::Stats(_) => Topic::Stats,
        }
    }
}
