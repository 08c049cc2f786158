//! CLI Commands

pub mod gateway;
pub mod serve;

pub use gateway::GatewayCommand;
pub use serve::{ServeCommand, ServiceKind};

use clap::Subcommand;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one domain service
    Serve(ServeCommand),
    /// Run the aggregation gateway
    Gateway(GatewayCommand),
}

/// Cancel `token` on Ctrl-C
pub(crate) async fn cancel_on_ctrl_c(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("shutdown requested");
            token.cancel();
        }
        Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
    }
}
