//! Binary entry point for the glysearch CLI.

use clap::Parser;

use glysearch::cli::{Cli, Commands};
use glysearch::{commands, logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    logger::init().map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;
    if let Some(log_file) = &cli.log_file {
        logger::set_log_file(log_file)?;
    }
    logger::set_log_to_stdout(cli.verbose);

    match cli.command {
        Commands::Query {
            query,
            domain,
            provider,
            json,
        } => commands::handle_query(query, domain, provider, json).await,
        Commands::Config {
            provider,
            api_key,
            model,
        } => commands::handle_config(provider, api_key, model),
    }
}
