//! In-Memory Store
//!
//! Map-backed implementation of the storage contract. Useful for
//! development, tests and single-process deployments.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Order, OrderStore, Record, RepositoryError, Store};
use shared::{CallContext, PageRequest};

/// In-memory store keyed by record id
///
/// Thread-safe implementation using RwLock. A `BTreeMap` keeps records in
/// id order, which is the order `list` must return. Every mutation happens
/// under one write lock, so a record is never observed half-written.
#[derive(Debug)]
pub struct InMemoryStore<T> {
    records: Arc<RwLock<BTreeMap<String, T>>>,
    closed: AtomicBool,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            closed: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_usable(&self, ctx: &CallContext) -> Result<(), RepositoryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RepositoryError::Closed);
        }
        ctx.check()?;
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, T>) -> R) -> Result<R, RepositoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::storage("Failed to acquire read lock"))?;
        Ok(f(&records))
    }

    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<String, T>) -> R) -> Result<R, RepositoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::storage("Failed to acquire write lock"))?;
        Ok(f(&mut records))
    }
}

#[async_trait]
impl<T: Record> Store<T> for InMemoryStore<T> {
    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    async fn put(&self, ctx: &CallContext, record: T) -> Result<(), RepositoryError> {
        self.ensure_usable(ctx)?;
        self.write(|records| {
            records.insert(record.id().to_string(), record);
        })
    }

    async fn get_by_id(&self, ctx: &CallContext, id: &str) -> Result<Option<T>, RepositoryError> {
        self.ensure_usable(ctx)?;
        self.read(|records| records.get(id).cloned())
    }

    async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<T>, RepositoryError> {
        self.ensure_usable(ctx)?;
        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(page.take).unwrap_or(usize::MAX);
        self.read(|records| records.values().skip(skip).take(take).cloned().collect())
    }

    async fn delete(&self, ctx: &CallContext, id: &str) -> Result<(), RepositoryError> {
        self.ensure_usable(ctx)?;
        self.write(|records| {
            records.remove(id);
        })
    }
}

#[async_trait]
impl OrderStore for InMemoryStore<Order> {
    async fn list_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.ensure_usable(ctx)?;
        self.read(|records| {
            records
                .values()
                .filter(|order| order.account_id == account_id)
                .cloned()
                .collect()
        })
    }
}
