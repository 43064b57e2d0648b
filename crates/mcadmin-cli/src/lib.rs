//! Command-line adapter for mcadmin.
//!
//! `main.rs` parses arguments, installs logging and hands each subcommand to
//! a handler in [`handlers`]. Everything the handlers need is resolved once
//! in [`bootstrap`].
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;

pub use bootstrap::{CliContext, CliPaths, bootstrap};
pub use commands::{Commands, RconArgs, ServerArgs};
pub use error::CliError;
pub use parser::Cli;
