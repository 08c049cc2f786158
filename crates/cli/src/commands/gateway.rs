//! protograph gateway command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use gateway::{http, Gateway};
use shared::GatewaySettings;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::cancel_on_ctrl_c;

#[derive(Debug, Args)]
pub struct GatewayCommand {
    /// JSON settings file; flags and environment take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Account service address (host:port)
    #[arg(long, env = "ACCOUNT_SERVICE_URL")]
    pub account_service_url: Option<String>,

    /// Catalog service address (host:port)
    #[arg(long, env = "CATALOG_SERVICE_URL")]
    pub catalog_service_url: Option<String>,

    /// Order service address (host:port)
    #[arg(long, env = "ORDER_SERVICE_URL")]
    pub order_service_url: Option<String>,

    /// Address for the HTTP surface
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,
}

impl GatewayCommand {
    pub fn settings(&self) -> anyhow::Result<GatewaySettings> {
        let mut settings = match &self.config {
            Some(path) => GatewaySettings::from_file(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => GatewaySettings::default(),
        };
        if let Some(addr) = &self.account_service_url {
            settings.backends.account = addr.clone();
        }
        if let Some(addr) = &self.catalog_service_url {
            settings.backends.catalog = addr.clone();
        }
        if let Some(addr) = &self.order_service_url {
            settings.backends.order = addr.clone();
        }
        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        Ok(settings)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;

        let gateway = Arc::new(
            Gateway::connect(&settings)
                .await
                .context("failed to connect to backend services")?,
        );
        let listener = TcpListener::bind(&settings.listen)
            .await
            .with_context(|| format!("failed to bind {}", settings.listen))?;

        let shutdown = CancellationToken::new();
        tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

        let router = http::router(gateway.clone(), settings.request_timeout());
        let served = http::serve(listener, router, shutdown).await;

        gateway.close();
        info!("gateway stopped");
        served.context("gateway server failed")
    }
}
