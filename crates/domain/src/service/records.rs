//! Operations shared by every record kind

use shared::{CallContext, PagePolicy, PageRequest, Result, ServiceError};

use crate::model::Record;
use crate::repository::Store;

pub(crate) async fn fetch<T, S>(store: &S, ctx: &CallContext, id: &str) -> Result<Option<T>>
where
    T: Record,
    S: Store<T> + ?Sized,
{
    Ok(store.get_by_id(ctx, id).await?)
}

pub(crate) async fn fetch_existing<T, S>(store: &S, ctx: &CallContext, id: &str) -> Result<T>
where
    T: Record,
    S: Store<T> + ?Sized,
{
    fetch(store, ctx, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(T::KIND, id))
}

pub(crate) async fn list_page<T, S>(
    store: &S,
    ctx: &CallContext,
    policy: &PagePolicy,
    page: PageRequest,
) -> Result<Vec<T>>
where
    T: Record,
    S: Store<T> + ?Sized,
{
    Ok(store.list(ctx, policy.effective(page)).await?)
}

/// Delete `id` and return the record as it was right before deletion.
///
/// Unlike the storage contract, an absent id is reported as `NotFound`.
pub(crate) async fn delete_existing<T, S>(store: &S, ctx: &CallContext, id: &str) -> Result<T>
where
    T: Record,
    S: Store<T> + ?Sized,
{
    let snapshot = fetch_existing(store, ctx, id).await?;
    store.delete(ctx, id).await?;
    Ok(snapshot)
}

/// Fail with `InvalidInput` naming `field` when `value` is blank
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(field, "cannot be empty"));
    }
    Ok(())
}

pub(crate) fn require_price(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::invalid(field, "must be a non-negative number"));
    }
    Ok(())
}
