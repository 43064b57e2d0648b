//! Command handlers.
//!
//! Each handler exposes `execute(...)`: it turns parsed arguments into calls
//! on the runtime or RCON crates and formats the outcome for the terminal.

pub mod console;
pub mod paths;
pub mod rcon;
pub mod run;
pub mod status;
