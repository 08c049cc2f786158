//! Test doubles for the domain ports

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use shared::{CallContext, PageRequest};

use crate::model::order::Order;
use crate::model::Record;
use crate::ports::{CredentialHasher, HashError, IdGenerator};
use crate::repository::{OrderStore, RepositoryError, Store};

/// Map-backed store that counts writes
pub(crate) struct MemoryStore<T> {
    records: RwLock<BTreeMap<String, T>>,
    pub(crate) puts: AtomicUsize,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            puts: AtomicUsize::new(0),
        }
    }
}

impl<T> MemoryStore<T> {
    pub(crate) fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Record> Store<T> for MemoryStore<T> {
    async fn close(&self) {}

    async fn put(&self, _ctx: &CallContext, record: T) -> Result<(), RepositoryError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.records
            .write()
            .unwrap()
            .insert(record.id().to_string(), record);
        Ok(())
    }

    async fn get_by_id(&self, _ctx: &CallContext, id: &str) -> Result<Option<T>, RepositoryError> {
        Ok(self.records.read().unwrap().get(id).cloned())
    }

    async fn list(&self, _ctx: &CallContext, page: PageRequest) -> Result<Vec<T>, RepositoryError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .values()
            .skip(page.skip as usize)
            .take(page.take as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, _ctx: &CallContext, id: &str) -> Result<(), RepositoryError> {
        self.records.write().unwrap().remove(id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore<Order> {
    async fn list_for_account(
        &self,
        _ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect())
    }
}

/// Store whose every call fails with a driver-looking message
pub(crate) struct BrokenStore;

#[async_trait]
impl<T: Record> Store<T> for BrokenStore {
    async fn close(&self) {}

    async fn put(&self, _ctx: &CallContext, _record: T) -> Result<(), RepositoryError> {
        Err(RepositoryError::storage("pq: relation \"accounts\" does not exist"))
    }

    async fn get_by_id(&self, _ctx: &CallContext, _id: &str) -> Result<Option<T>, RepositoryError> {
        Err(RepositoryError::storage("pq: connection refused"))
    }

    async fn list(&self, _ctx: &CallContext, _page: PageRequest) -> Result<Vec<T>, RepositoryError> {
        Err(RepositoryError::storage("pq: connection refused"))
    }

    async fn delete(&self, _ctx: &CallContext, _id: &str) -> Result<(), RepositoryError> {
        Err(RepositoryError::storage("pq: connection refused"))
    }
}

/// Reversible-looking but non-plaintext hash, cheap enough for tests
pub(crate) struct FakeHasher;

impl CredentialHasher for FakeHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(format!("fake${}", plaintext.chars().rev().collect::<String>()))
    }
}

#[derive(Default)]
pub(crate) struct CountingIds(AtomicU64);

impl IdGenerator for CountingIds {
    fn next_id(&self) -> String {
        format!("id-{:06}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
