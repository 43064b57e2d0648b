//! Source RCON client for the managed Minecraft server.
//!
//! [`RconClient`] keeps one authenticated TCP session, sends commands as
//! `SERVERDATA_EXECCOMMAND` packets and reassembles fragmented responses by
//! following each command with an empty sentinel request. Connection-level
//! failures trigger a reconnect and a retry of the whole exchange.
#![deny(unused_crate_dependencies)]

mod client;
mod error;
pub mod packet;

pub use client::{DEFAULT_RETRIES, RconClient};
pub use error::RconError;
pub use packet::{Packet, RequestIds};
