//! ProtoGraph CLI - Runs the domain services and the aggregation gateway
//!
//! Usage:
//!   protograph serve account   - Run the account service
//!   protograph serve catalog   - Run the catalog service
//!   protograph serve order     - Run the order service
//!   protograph gateway         - Run the gateway HTTP surface

use clap::Parser;
use cli::commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "protograph")]
#[command(about = "ProtoGraph - Domain services behind an aggregation gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => cmd.run().await,
        Commands::Gateway(cmd) => cmd.run().await,
    }
}
