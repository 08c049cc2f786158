//! Backend connection group
//!
//! One client per domain service. The group is built all-or-nothing: if any
//! connection fails, every connection opened before it is closed before the
//! error is returned.

use std::sync::Arc;
use std::time::Duration;

use rpc::{AccountApi, AccountClient, CatalogApi, CatalogClient, Closeable, OrderApi, OrderClient};
use shared::{BackendAddresses, Result};
use tracing::{debug, info, warn};

pub struct Backends {
    pub account: Arc<dyn AccountApi>,
    pub catalog: Arc<dyn CatalogApi>,
    pub order: Arc<dyn OrderApi>,
}

/// Handles opened so far; closes them on drop unless released
#[derive(Default)]
struct OpenedHandles {
    handles: Vec<(&'static str, Arc<dyn Closeable>)>,
}

impl OpenedHandles {
    fn track(&mut self, name: &'static str, handle: Arc<dyn Closeable>) {
        self.handles.push((name, handle));
    }

    /// Construction succeeded; ownership moves to the caller
    fn release(mut self) {
        self.handles.clear();
    }
}

impl Drop for OpenedHandles {
    fn drop(&mut self) {
        for (name, handle) in self.handles.drain(..).rev() {
            debug!(backend = name, "closing backend after failed construction");
            handle.close();
        }
    }
}

impl Backends {
    /// Connect to account, catalog and order services, in that order
    pub async fn connect(addresses: &BackendAddresses, timeout: Duration) -> Result<Self> {
        let mut opened = OpenedHandles::default();

        let account = Arc::new(
            AccountClient::connect(&addresses.account, timeout)
                .await
                .inspect_err(|e| warn!(backend = "account", error = %e, "backend connection failed"))?,
        );
        opened.track("account", account.clone());
        info!(addr = %addresses.account, "connected to account service");

        let catalog = Arc::new(
            CatalogClient::connect(&addresses.catalog, timeout)
                .await
                .inspect_err(|e| warn!(backend = "catalog", error = %e, "backend connection failed"))?,
        );
        opened.track("catalog", catalog.clone());
        info!(addr = %addresses.catalog, "connected to catalog service");

        let order = Arc::new(
            OrderClient::connect(&addresses.order, timeout)
                .await
                .inspect_err(|e| warn!(backend = "order", error = %e, "backend connection failed"))?,
        );
        opened.track("order", order.clone());
        info!(addr = %addresses.order, "connected to order service");

        opened.release();
        Ok(Self {
            account,
            catalog,
            order,
        })
    }

    /// Close every backend connection. Idempotent.
    pub fn close(&self) {
        self.account.close();
        self.catalog.close();
        self.order.close();
    }
}
