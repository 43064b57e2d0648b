//! Interactive RCON console.
//!
//! Reads commands with rustyline and prints each reply. A failed command
//! prints a fixed notice and the prompt carries on; Ctrl-C or Ctrl-D leaves.

use anyhow::Result;
use mcadmin_rcon::RconClient;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, error};

use crate::commands::RconArgs;
use crate::error::CliError;

const PROMPT: &str = "> ";

/// Shown in place of a reply when a command fails.
pub const UNREACHABLE_NOTICE: &str = "RCON server unreachable";

pub async fn execute(args: &RconArgs) -> Result<()> {
    let settings = args.settings();
    let client = RconClient::new(&settings, args.password.clone());
    let mut editor = DefaultEditor::new().map_err(CliError::from)?;

    println!(
        "RCON console for {}:{} (Ctrl-D to quit)",
        settings.host, settings.port
    );

    loop {
        let line = tokio::task::block_in_place(|| editor.readline(PROMPT));
        match line {
            Ok(line) => {
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(command) {
                    debug!(error = %e, "Could not record history");
                }
                println!("{}", respond(&client, command, args.retry).await);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                client.disconnect().await;
                return Err(CliError::from(e).into());
            }
        }
    }

    client.disconnect().await;
    Ok(())
}

/// Reply to print for `command`.
pub async fn respond(client: &RconClient, command: &str, retry: u32) -> String {
    match client.command_with_retry(command, retry).await {
        Ok(reply) => {
            debug!(%command, %reply, "Console command answered");
            reply.trim_end().to_string()
        }
        Err(e) => {
            error!(%command, error = %e, "Console command failed");
            UNREACHABLE_NOTICE.to_string()
        }
    }
}
