//! Cyoda command-line client
//!
//! Usage:
//!   cyoda --model customer get <id>
//!   cyoda --model customer search --where tier=gold --where age:gt=30 --limit 10
//!   cyoda --model order transition <id> approve
//!
//! Connection settings come from `--config <file>` or the CYODA_*
//! environment variables. Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use cyoda_cli::{auth_provider, execute, load_config, Cli};
use cyoda_service::CyodaServices;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let model = cli.model()?;
    let config = load_config(cli.config.as_deref())?;
    debug!("Using platform at {}", config.api_url);

    let auth = auth_provider(&config, cli.token.as_deref())?;
    let services = CyodaServices::build(config, auth).context("Failed to set up client")?;

    let output = execute(services.service(), model, cli.version.as_deref(), &cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
