mod commands;

use clap::{Parser, Subcommand};
use partsdb_core::{Appliance, PartType};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "partsdb-cli")]
#[command(about = "PartSelect parts scraper command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the scrape pipeline once and write the snapshot.
    Scrape,
    /// Summarise the stored snapshot, optionally listing matching parts.
    Show {
        /// e.g. "drain pump", "filter".
        #[arg(long)]
        part_type: Option<PartType>,
        /// e.g. "refrigerator", "dishwasher".
        #[arg(long)]
        appliance: Option<Appliance>,
    },
    /// Print the support phone number from the stored snapshot.
    Phone,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = partsdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape => commands::run_scrape(&config).await,
        Commands::Show {
            part_type,
            appliance,
        } => commands::run_show(&config, part_type, appliance).await,
        Commands::Phone => commands::run_phone(&config).await,
    }
}

#[cfg(test)]
mod tests;
