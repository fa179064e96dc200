mod cli;
mod commands;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,expiryguard_core=info".into()),
        )
        .with_target(false)
        .init();

    let core = setup::prepare_core(&cli)?;

    match cli.command {
        Commands::Run => commands::run::run(core).await,
        Commands::Once => commands::once::run(core).await,
        Commands::Secret { command } => commands::secret::run(core, command).await,
        Commands::TestEmail { to } => commands::test_email::run(core, &to).await,
    }
}
