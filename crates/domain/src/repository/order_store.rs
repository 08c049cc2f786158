//! OrderStore - order persistence with the per-account query

use async_trait::async_trait;
use shared::CallContext;

use super::store::{RepositoryError, Store};
use crate::model::order::Order;

#[async_trait]
pub trait OrderStore: Store<Order> {
    /// All orders placed by `account_id`, ordered by id ascending
    async fn list_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, RepositoryError>;
}
