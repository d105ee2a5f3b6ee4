//! Formcheck CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formcheck_cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Exercises => {
            commands::exercises();
            Ok(())
        }
        Commands::Inspect(args) => commands::inspect(args).await,
        Commands::Replay(args) => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::replay(args, &config).await
        }
        Commands::Simulate(args) => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::simulate(args, &config).await
        }
    }
}
