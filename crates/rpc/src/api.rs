//! Service APIs as seen by a remote caller
//!
//! The typed clients implement these; the gateway depends only on the
//! traits so it can be exercised against in-process doubles.

use async_trait::async_trait;
use domain::{AccountInput, AccountUpdate, OrderInput, ProductInput};
use shared::{CallContext, PageRequest, Result};

use crate::dto::{AccountDto, OrderDto, ProductDto};

/// A handle holding a remote connection
pub trait Closeable: Send + Sync {
    /// Release the connection. Safe to call more than once.
    fn close(&self);
}

#[async_trait]
pub trait AccountApi: Closeable {
    async fn create_account(&self, ctx: &CallContext, input: AccountInput) -> Result<AccountDto>;
    async fn get_account(&self, ctx: &CallContext, id: &str) -> Result<Option<AccountDto>>;
    async fn list_accounts(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<AccountDto>>;
    async fn update_account(&self, ctx: &CallContext, id: &str, update: AccountUpdate) -> Result<AccountDto>;
    async fn delete_account(&self, ctx: &CallContext, id: &str) -> Result<AccountDto>;
}

#[async_trait]
pub trait CatalogApi: Closeable {
    async fn create_product(&self, ctx: &CallContext, input: ProductInput) -> Result<ProductDto>;
    async fn get_product(&self, ctx: &CallContext, id: &str) -> Result<Option<ProductDto>>;
    async fn list_products(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<ProductDto>>;
    async fn update_product(&self, ctx: &CallContext, id: &str, input: ProductInput) -> Result<ProductDto>;
    async fn delete_product(&self, ctx: &CallContext, id: &str) -> Result<ProductDto>;
}

#[async_trait]
pub trait OrderApi: Closeable {
    async fn create_order(&self, ctx: &CallContext, input: OrderInput) -> Result<OrderDto>;
    async fn get_order(&self, ctx: &CallContext, id: &str) -> Result<Option<OrderDto>>;
    async fn list_orders(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<OrderDto>>;
    async fn list_orders_for_account(&self, ctx: &CallContext, account_id: &str) -> Result<Vec<OrderDto>>;
    async fn update_order(&self, ctx: &CallContext, id: &str, input: OrderInput) -> Result<OrderDto>;
    async fn delete_order(&self, ctx: &CallContext, id: &str) -> Result<OrderDto>;
}
