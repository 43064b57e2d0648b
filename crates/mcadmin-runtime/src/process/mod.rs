//! OS-level handling of the server child process.
//!
//! - `launch`: launcher preconditions and spawning
//! - `shutdown`: console stop with SIGTERM escalation
//! - `stream`: stdout line reader feeding the stats store and the event sink

pub mod launch;
pub mod shutdown;
pub mod stream;

pub use launch::{JAVA_BIN_ENV, JVM_ARGS_ENV, LaunchedServer, shell_join, spawn_server};
pub use shutdown::{exit_code, stop_child};
pub use stream::spawn_stdout_reader;
