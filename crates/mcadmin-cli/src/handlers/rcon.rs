//! One-shot RCON command handler.

use anyhow::Result;
use mcadmin_rcon::RconClient;
use tracing::debug;

use crate::commands::RconArgs;
use crate::error::CliError;

pub async fn execute(args: &RconArgs, words: &[String]) -> Result<()> {
    let reply = send(args, words).await?;
    if !reply.is_empty() {
        println!("{}", reply.trim_end());
    }
    Ok(())
}

/// Join `words` into one command, send it and return the reply.
pub async fn send(args: &RconArgs, words: &[String]) -> Result<String, CliError> {
    let command = words.join(" ");
    let settings = args.settings();
    debug!(host = %settings.host, port = settings.port, %command, "Sending RCON command");

    let client = RconClient::new(&settings, args.password.clone());
    let result = client.command_with_retry(&command, args.retry).await;
    client.disconnect().await;
    Ok(result?)
}
