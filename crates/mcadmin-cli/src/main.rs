//! CLI entry point.

use clap::{CommandFactory, Parser};

use mcadmin_cli::{Cli, CliError, Commands, bootstrap, handlers, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so clap sees MCADMIN_* from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let log_guard = logging::init_tracing(cli.verbose, cli.log_dir.as_deref())?;

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let result = dispatch(&cli, command).await;
    if let Err(err) = &result {
        if let Some(cli_err) = err.downcast_ref::<CliError>() {
            tracing::debug!(error = ?cli_err, "Command failed");
            eprintln!("Error: {cli_err}");
            drop(log_guard);
            std::process::exit(cli_err.exit_code());
        }
    }
    result
}

async fn dispatch(cli: &Cli, command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run { start, server } => {
            let ctx = bootstrap(cli)?;
            handlers::run::execute(&ctx, server.to_config()?, *start).await?;
        }
        Commands::Status => {
            let ctx = bootstrap(cli)?;
            handlers::status::execute(&ctx)?;
        }
        Commands::Rcon { rcon, words } => {
            handlers::rcon::execute(rcon, words).await?;
        }
        Commands::Console { rcon } => {
            handlers::console::execute(rcon).await?;
        }
        Commands::Paths => {
            let ctx = bootstrap(cli)?;
            handlers::paths::execute(&ctx)?;
        }
    }
    Ok(())
}
