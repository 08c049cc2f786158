//! OrderService - placing and maintaining orders

use std::sync::Arc;

use chrono::Utc;
use shared::{CallContext, PagePolicy, PageRequest, Result, ServiceError};
use tracing::debug;

use super::records::{self, require, require_price};
use crate::model::order::{Order, OrderedProduct};
use crate::ports::IdGenerator;
use crate::repository::OrderStore;

/// Fields for placing an order. Unit prices are the caller's price snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderInput {
    pub account_id: String,
    pub products: Vec<OrderedProduct>,
}

impl OrderInput {
    fn validate(&self) -> Result<()> {
        require("account_id", &self.account_id)?;
        if self.products.is_empty() {
            return Err(ServiceError::invalid(
                "products",
                "an order needs at least one product",
            ));
        }
        for (i, line) in self.products.iter().enumerate() {
            require(&format!("products[{}].product_id", i), &line.product_id)?;
            if line.quantity == 0 {
                return Err(ServiceError::invalid(
                    format!("products[{}].quantity", i),
                    "must be at least 1",
                ));
            }
            require_price(&format!("products[{}].unit_price", i), line.unit_price)?;
        }
        Ok(())
    }
}

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    ids: Arc<dyn IdGenerator>,
    paging: PagePolicy,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, ids: Arc<dyn IdGenerator>) -> Self {
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

    pub async fn create(&self, ctx: &CallContext, input: OrderInput) -> Result<Order> {
        input.validate()?;

        let order = Order {
            id: self.ids.next_id(),
            created_at: Utc::now(),
            account_id: input.account_id,
            total_price: Order::compute_total(&input.products),
            products: input.products,
        };
        self.store.put(ctx, order.clone()).await?;
        debug!(order_id = %order.id, account_id = %order.account_id, "order created");
        Ok(order)
    }

    pub async fn get(&self, ctx: &CallContext, id: &str) -> Result<Option<Order>> {
        records::fetch(self.store.as_ref(), ctx, id).await
    }

    pub async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<Order>> {
        records::list_page(self.store.as_ref(), ctx, &self.paging, page).await
    }

    /// All orders of one account; empty when it has none
    pub async fn list_for_account(&self, ctx: &CallContext, account_id: &str) -> Result<Vec<Order>> {
        require("account_id", account_id)?;
        Ok(self.store.list_for_account(ctx, account_id).await?)
    }

    /// Replace the line items (and owner) of an order, keeping its id and creation time
    pub async fn update(&self, ctx: &CallContext, id: &str, input: OrderInput) -> Result<Order> {
        input.validate()?;

        let current = records::fetch_existing(self.store.as_ref(), ctx, id).await?;
        let order = Order {
            id: current.id,
            created_at: current.created_at,
            account_id: input.account_id,
            total_price: Order::compute_total(&input.products),
            products: input.products,
        };
        self.store.put(ctx, order.clone()).await?;
        debug!(order_id = %order.id, "order updated");
        Ok(order)
    }

    pub async fn delete(&self, ctx: &CallContext, id: &str) -> Result<Order> {
        let order = records::delete_existing(self.store.as_ref(), ctx, id).await?;
        debug!(order_id = %order.id, "order deleted");
        Ok(order)
    }
}
