//! protograph serve command

use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adapter::{Argon2Hasher, InMemoryStore, PostgresStore, UlidGenerator};
use anyhow::Context;
use clap::{Args, ValueEnum};
use domain::{
    Account, AccountService, CatalogService, IdGenerator, Order, OrderService, OrderStore, Product, Store,
};
use rpc::{AccountHandler, CatalogHandler, OrderHandler, RpcHandler, RpcServer};
use shared::ServiceSettings;
use tracing::{debug, info, warn};

use super::cancel_on_ctrl_c;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    Account,
    Catalog,
    Order,
}

impl ServiceKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Catalog => "catalog",
            Self::Order => "order",
        }
    }
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Domain service to run
    #[arg(value_enum)]
    pub service: ServiceKind,

    /// JSON settings file; flags and environment take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// PostgreSQL connection string (in-memory storage when absent)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to accept RPC connections on
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,
}

impl ServeCommand {
    pub fn settings(&self) -> anyhow::Result<ServiceSettings> {
        let mut settings = match &self.config {
            Some(path) => ServiceSettings::from_file(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => ServiceSettings::default(),
        };
        if let Some(url) = &self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        Ok(settings)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        let (handler, storage) = build_service(self.service, &settings).await?;

        let served = self.serve(&settings, handler).await;
        storage.close().await;

        info!(service = self.service.name(), "service stopped");
        served
    }

    async fn serve(&self, settings: &ServiceSettings, handler: Arc<dyn RpcHandler>) -> anyhow::Result<()> {
        let server = RpcServer::bind(&settings.listen, handler)
            .await
            .with_context(|| format!("failed to bind {}", settings.listen))?;
        info!(service = self.service.name(), addr = %server.local_addr()?, "service listening");

        tokio::spawn(cancel_on_ctrl_c(server.shutdown_token()));
        server.serve().await?;
        Ok(())
    }
}

/// Store behind a running service; closed once the server stops
pub enum Storage {
    Accounts(Arc<dyn Store<Account>>),
    Products(Arc<dyn Store<Product>>),
    Orders(Arc<dyn OrderStore>),
}

impl Storage {
    pub async fn close(&self) {
        match self {
            Self::Accounts(store) => store.close().await,
            Self::Products(store) => store.close().await,
            Self::Orders(store) => store.close().await,
        }
        debug!("storage closed");
    }
}

/// Wire storage, service and RPC handler for `kind`
pub async fn build_service(
    kind: ServiceKind,
    settings: &ServiceSettings,
) -> anyhow::Result<(Arc<dyn RpcHandler>, Storage)> {
    let postgres = match &settings.database_url {
        Some(url) => {
            let store = retry("database connection", settings.connect_attempts, settings.connect_delay(), || {
                PostgresStore::connect(url)
            })
            .await
            .context("failed to connect to database")?;
            Some(Arc::new(store))
        }
        None => {
            info!(service = kind.name(), "no database configured, using in-memory storage");
            None
        }
    };
    let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator);

    let wired = match kind {
        ServiceKind::Account => {
            let store: Arc<dyn Store<Account>> = match &postgres {
                Some(pg) => pg.clone(),
                None => Arc::new(InMemoryStore::<Account>::new()),
            };
            let service = AccountService::new(store.clone(), Arc::new(Argon2Hasher::default()), ids)
                .with_paging(settings.paging);
            let handler: Arc<dyn RpcHandler> = Arc::new(AccountHandler::new(Arc::new(service)));
            (handler, Storage::Accounts(store))
        }
        ServiceKind::Catalog => {
            let store: Arc<dyn Store<Product>> = match &postgres {
                Some(pg) => pg.clone(),
                None => Arc::new(InMemoryStore::<Product>::new()),
            };
            let service = CatalogService::new(store.clone(), ids).with_paging(settings.paging);
            let handler: Arc<dyn RpcHandler> = Arc::new(CatalogHandler::new(Arc::new(service)));
            (handler, Storage::Products(store))
        }
        ServiceKind::Order => {
            let store: Arc<dyn OrderStore> = match &postgres {
                Some(pg) => pg.clone(),
                None => Arc::new(InMemoryStore::<Order>::new()),
            };
            let service = OrderService::new(store.clone(), ids).with_paging(settings.paging);
            let handler: Arc<dyn RpcHandler> = Arc::new(OrderHandler::new(Arc::new(service)));
            (handler, Storage::Orders(store))
        }
    };
    Ok(wired)
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures
pub async fn retry<T, E, F, Fut>(what: &str, attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(what, attempt, attempts, error = %e, "attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
