//! Store - generic persistence contract for one record kind

use async_trait::async_trait;
use shared::{CallContext, Interrupted, PageRequest, ServiceError};
use thiserror::Error;

use crate::model::Record;

/// Errors that can occur during storage operations.
///
/// There is deliberately no "not found" variant: absence is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Failed to read or persist
    #[error("storage error: {message}")]
    Storage { message: String },

    /// The store was closed
    #[error("storage is closed")]
    Closed,

    #[error("storage call cancelled")]
    Cancelled,

    #[error("storage call exceeded its deadline")]
    DeadlineExceeded,
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        RepositoryError::Storage {
            message: message.into(),
        }
    }
}

impl From<Interrupted> for RepositoryError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => RepositoryError::Cancelled,
            Interrupted::DeadlineExceeded => RepositoryError::DeadlineExceeded,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Cancelled => ServiceError::Cancelled,
            RepositoryError::DeadlineExceeded => ServiceError::DeadlineExceeded,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Persistence contract for records of kind `T`.
///
/// Implementations must be safe for many concurrent in-flight calls; callers
/// do not serialize access. Every call honors `ctx`: once it is cancelled or
/// expired the call returns promptly, and a mutation is either fully applied
/// or not applied at all.
#[async_trait]
pub trait Store<T: Record>: Send + Sync {
    /// Release underlying resources. Safe to call more than once.
    async fn close(&self);

    /// Insert or replace the record keyed by its id
    async fn put(&self, ctx: &CallContext, record: T) -> Result<(), RepositoryError>;

    /// `Ok(None)` when absent, `Err` only when storage failed
    async fn get_by_id(&self, ctx: &CallContext, id: &str) -> Result<Option<T>, RepositoryError>;

    /// Records ordered by id ascending; empty when nothing matches
    async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<T>, RepositoryError>;

    /// Remove the record. Deleting an absent id is not an error.
    async fn delete(&self, ctx: &CallContext, id: &str) -> Result<(), RepositoryError>;
}
