//! Classification of server stdout lines.
//!
//! The vanilla (and most modded) servers log a handful of lines that tell us
//! when the world finished loading and who is online. Patterns are tried in
//! order and the first match wins.

use mcadmin_core::{ServerStats, StatsUpdate};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static INITIALIZED: LazyLock<Regex> = LazyLock::new(|| pattern(r"\bDone \(\d+\.\d+s\)!"));

static PLAYER_JOINED: LazyLock<Regex> = LazyLock::new(|| pattern(r"\bjoined the game\b"));

static PLAYER_LEFT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\b(?:left the game|lost connection)\b"));

// `list` output: vanilla, then the Bukkit-style variant.
static PLAYER_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?:There are\s+(?P<vanilla>\d+)\s+of a max of\s+\d+\s+players online:|Players\s*\((?P<bukkit>\d+)\):)",
    )
});

fn pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .expect("log pattern is a valid regex")
}

/// What a log line says about the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSignal {
    /// World loaded, server accepts players.
    Initialized,
    PlayerJoined,
    PlayerLeft,
    /// Authoritative online count from a `list` response.
    PlayerCount(u32),
}

impl LogSignal {
    /// Stats update this signal implies, given the current stats.
    pub const fn update_for(self, current: &ServerStats) -> StatsUpdate {
        match self {
            Self::Initialized => StatsUpdate::initialized(),
            Self::PlayerJoined => StatsUpdate::players(current.players.saturating_add(1)),
            Self::PlayerLeft => StatsUpdate::players(current.players.saturating_sub(1)),
            Self::PlayerCount(count) => StatsUpdate::players(count),
        }
    }
}

/// Classify one decoded stdout line.
pub fn classify(line: &str) -> Option<LogSignal> {
    if INITIALIZED.is_match(line) {
        return Some(LogSignal::Initialized);
    }
    if PLAYER_JOINED.is_match(line) {
        return Some(LogSignal::PlayerJoined);
    }
    if PLAYER_LEFT.is_match(line) {
        return Some(LogSignal::PlayerLeft);
    }

    let caps = PLAYER_COUNT.captures(line)?;
    caps.name("vanilla")
        .or_else(|| caps.name("bukkit"))
        .and_then(|n| n.as_str().parse().ok())
        .map(LogSignal::PlayerCount)
}
