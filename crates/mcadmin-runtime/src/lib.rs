//! Process runtime for mcadmin.
//!
//! - [`ServerRunner`]: supervises the Minecraft server process and serializes
//!   start/stop/restart through one event loop
//! - [`StatsStore`]: durable `server_stats.json` with lock-free reads
//! - [`EventDispatcher`]: topic-aware fan-out of logs and stats to observers
#![deny(unused_crate_dependencies)]

pub mod dispatcher;
mod error;
pub mod log_parser;
pub mod process;
mod runner;
mod stats_store;

pub use dispatcher::{EventDispatcher, EventPublisher, Subscription};
pub use error::{DispatcherError, RunnerError};
pub use log_parser::{LogSignal, classify};
pub use runner::{ControlKind, RunnerTimeouts, ServerRunner};
pub use stats_store::StatsStore;
