//! CatalogService - product catalog maintenance

use std::sync::Arc;

use shared::{CallContext, PagePolicy, PageRequest, Result};
use tracing::debug;

use super::records::{self, require, require_price};
use crate::model::product::Product;
use crate::ports::IdGenerator;
use crate::repository::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl ProductInput {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require_price("price", self.price)
    }
}

pub struct CatalogService {
    store: Arc<dyn Store<Product>>,
    ids: Arc<dyn IdGenerator>,
    paging: PagePolicy,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store<Product>>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            store,
            ids,
            paging: PagePolicy::default(),
        }
    }

    /// Builder: set the paging policy
    pub fn with_paging(mut self, paging: PagePolicy) -> Self {
        self.paging = paging;
        self
    }

    pub async fn create(&self, ctx: &CallContext, input: ProductInput) -> Result<Product> {
        input.validate()?;

        let product = Product {
            id: self.ids.next_id(),
            name: input.name,
            description: input.description,
            price: input.price,
        };
        self.store.put(ctx, product.clone()).await?;
        debug!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn get(&self, ctx: &CallContext, id: &str) -> Result<Option<Product>> {
        records::fetch(self.store.as_ref(), ctx, id).await
    }

    pub async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<Product>> {
        records::list_page(self.store.as_ref(), ctx, &self.paging, page).await
    }

    pub async fn update(&self, ctx: &CallContext, id: &str, input: ProductInput) -> Result<Product> {
        input.validate()?;

        let current = records::fetch_existing(self.store.as_ref(), ctx, id).await?;
        let product = Product {
            id: current.id,
            name: input.name,
            description: input.description,
            price: input.price,
        };
        self.store.put(ctx, product.clone()).await?;
        debug!(product_id = %product.id, "product updated");
        Ok(product)
    }

    pub async fn delete(&self, ctx: &CallContext, id: &str) -> Result<Product> {
        let product = records::delete_existing(self.store.as_ref(), ctx, id).await?;
        debug!(product_id = %product.id, "product deleted");
        Ok(product)
    }
}
