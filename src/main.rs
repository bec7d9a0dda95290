//! Stress Analytics - Main Entry Point
//!
//! Runs the HTTP API by default; `summary`, `train` and `synthesize` work
//! directly against the configured data source.

use clap::Parser;
use stress_analytics::cli::{cmd_serve, cmd_summary, cmd_synthesize, cmd_train, Cli, Commands};
use stress_analytics::server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stress_analytics=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            cmd_serve(&cli.source, &host, port).await?;
        }
        Some(Commands::Summary) => {
            cmd_summary(&cli.source)?;
        }
        Some(Commands::Train { trees }) => {
            cmd_train(&cli.source, trees)?;
        }
        Some(Commands::Synthesize { output, input, samples, seed, trees }) => {
            cmd_synthesize(&cli.source, input.as_deref(), &output, samples, seed, trees)?;
        }
        None => {
            let config = ServerConfig::default();
            cmd_serve(&cli.source, &config.host, config.port).await?;
        }
    }

    Ok(())
}
