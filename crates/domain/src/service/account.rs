//! AccountService - account registration and maintenance

use std::sync::Arc;

use shared::{CallContext, PagePolicy, PageRequest, Result, ServiceError};
use tracing::debug;
use zeroize::Zeroizing;

use super::records::{self, require};
use crate::model::account::Account;
use crate::ports::{CredentialHasher, IdGenerator};
use crate::repository::Store;

/// Fields for a new account. `password` is plaintext and is wiped once hashed.
#[derive(Clone)]
pub struct AccountInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AccountInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Replacement fields for an existing account; `None` keeps the current credential
#[derive(Clone)]
pub struct AccountUpdate {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
}

impl core::fmt::Debug for AccountUpdate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub struct AccountService {
    store: Arc<dyn Store<Account>>,
    hasher: Arc<dyn CredentialHasher>,
    ids: Arc<dyn IdGenerator>,
    paging: PagePolicy,
}

impl AccountService {
    pub const MIN_PASSWORD_LEN: usize = 8;

    pub fn new(
        store: Arc<dyn Store<Account>>,
        hasher: Arc<dyn CredentialHasher>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            hasher,
            ids,
            paging: PagePolicy::default(),
        }
    }

    /// Builder: set the paging policy
    pub fn with_paging(mut self, paging: PagePolicy) -> Self {
        self.paging = paging;
        self
    }

    pub async fn create(&self, ctx: &CallContext, input: AccountInput) -> Result<Account> {
        let AccountInput {
            name,
            email,
            password,
        } = input;
        let password = Zeroizing::new(password);

        validate_profile(&name, &email)?;
        validate_password(&password)?;

        let password_hash = self.hash_password(ctx, password).await?;
        let account = Account {
            id: self.ids.next_id(),
            name,
            email,
            password_hash,
        };

        self.store.put(ctx, account.clone()).await?;
        debug!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// `Ok(None)` when no account has this id
    pub async fn get(&self, ctx: &CallContext, id: &str) -> Result<Option<Account>> {
        records::fetch(self.store.as_ref(), ctx, id).await
    }

    pub async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<Account>> {
        records::list_page(self.store.as_ref(), ctx, &self.paging, page).await
    }

    pub async fn update(&self, ctx: &CallContext, id: &str, update: AccountUpdate) -> Result<Account> {
        let AccountUpdate {
            name,
            email,
            password,
        } = update;
        let password = password.map(Zeroizing::new);

        validate_profile(&name, &email)?;
        if let Some(password) = &password {
            validate_password(password)?;
        }

        let current = records::fetch_existing(self.store.as_ref(), ctx, id).await?;
        let password_hash = match password {
            Some(password) => self.hash_password(ctx, password).await?,
            None => current.password_hash,
        };

        let account = Account {
            id: current.id,
            name,
            email,
            password_hash,
        };
        self.store.put(ctx, account.clone()).await?;
        debug!(account_id = %account.id, "account updated");
        Ok(account)
    }

    /// Delete and return the account as it was immediately before deletion
    pub async fn delete(&self, ctx: &CallContext, id: &str) -> Result<Account> {
        let account = records::delete_existing(self.store.as_ref(), ctx, id).await?;
        debug!(account_id = %account.id, "account deleted");
        Ok(account)
    }

    /// Hash on the blocking pool; the plaintext is dropped (and wiped) inside the task.
    async fn hash_password(&self, ctx: &CallContext, password: Zeroizing<String>) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        let task = tokio::task::spawn_blocking(move || hasher.hash(&password));

        ctx.run(task)
            .await?
            .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

fn validate_profile(name: &str, email: &str) -> Result<()> {
    require("name", name)?;
    require("email", email)?;
    if !email.contains('@') {
        return Err(ServiceError::invalid("email", "must contain '@'"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < AccountService::MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(
            "password",
            format!(
                "must be at least {} characters",
                AccountService::MIN_PASSWORD_LEN
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenStore, CountingIds, FakeHasher, MemoryStore};

    fn service_with(store: Arc<MemoryStore<Account>>) -> AccountService {
        AccountService::new(store, Arc::new(FakeHasher), Arc::new(CountingIds::default()))
    }

    fn input(name: &str, email: &str, password: &str) -> AccountInput {
        AccountInput {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    // ============== Create ==============

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let ctx = CallContext::background();

        let created = service
            .create(&ctx, input("Ada", "ada@example.com", "correct horse"))
            .await
            .unwrap();

        let fetched = service.get(&ctx, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Ada");
        assert_eq!(fetched.email, "ada@example.com");
        assert_ne!(fetched.password_hash, "correct horse");
        assert!(!fetched.password_hash.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name_without_storage_call() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        let err = service
            .create(&CallContext::background(), input("  ", "ada@example.com", "long enough"))
            .await
            .unwrap_err();

        assert_eq!(err.field(), Some("name"));
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_email() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let ctx = CallContext::background();

        let err = service.create(&ctx, input("Ada", "", "long enough")).await.unwrap_err();
        assert_eq!(err.field(), Some("email"));

        let err = service
            .create(&ctx, input("Ada", "not-an-address", "long enough"))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("email"));
    }

    #[tokio::test]
    async fn test_create_rejects_short_password() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        let err = service
            .create(&CallContext::background(), input("Ada", "ada@example.com", "short"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput { .. }));
        assert_eq!(err.field(), Some("password"));
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal() {
        let service = AccountService::new(
            Arc::new(BrokenStore),
            Arc::new(FakeHasher),
            Arc::new(CountingIds::default()),
        );

        let err = service
            .create(&CallContext::background(), input("Ada", "ada@example.com", "long enough"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Internal(_)));
    }

    // ============== Get / List ==============

    #[tokio::test]
    async fn test_get_unknown_id_is_none() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let found = service.get(&CallContext::background(), "never-created").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_applies_paging_policy() {
        let service =
            service_with(Arc::new(MemoryStore::default())).with_paging(PagePolicy::new(2, 3));
        let ctx = CallContext::background();

        for i in 0..5 {
            service
                .create(&ctx, input(&format!("user{}", i), "u@example.com", "long enough"))
                .await
                .unwrap();
        }

        assert_eq!(service.list(&ctx, PageRequest::new(0, 0)).await.unwrap().len(), 2);
        assert_eq!(service.list(&ctx, PageRequest::new(0, 50)).await.unwrap().len(), 3);
        assert_eq!(service.list(&ctx, PageRequest::new(4, 50)).await.unwrap().len(), 1);
    }

    // ============== Update ==============

    #[tokio::test]
    async fn test_update_keeps_hash_without_new_password() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let ctx = CallContext::background();
        let created = service
            .create(&ctx, input("Ada", "ada@example.com", "long enough"))
            .await
            .unwrap();

        let updated = service
            .update(
                &ctx,
                &created.id,
                AccountUpdate {
                    name: "Ada L.".to_string(),
                    email: "ada@lovelace.dev".to_string(),
                    password: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.password_hash, created.password_hash);
    }

    #[tokio::test]
    async fn test_update_rehashes_new_password() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let ctx = CallContext::background();
        let created = service
            .create(&ctx, input("Ada", "ada@example.com", "long enough"))
            .await
            .unwrap();

        let updated = service
            .update(
                &ctx,
                &created.id,
                AccountUpdate {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    password: Some("another secret".to_string()),
                },
            )
            .await
            .unwrap();

        assert_ne!(updated.password_hash, created.password_hash);
        assert_ne!(updated.password_hash, "another secret");
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let err = service
            .update(
                &CallContext::background(),
                "missing",
                AccountUpdate {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    password: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    // ============== Delete ==============

    #[tokio::test]
    async fn test_delete_returns_snapshot_then_not_found() {
        let service = service_with(Arc::new(MemoryStore::default()));
        let ctx = CallContext::background();
        let created = service
            .create(&ctx, input("Ada", "ada@example.com", "long enough"))
            .await
            .unwrap();

        let deleted = service.delete(&ctx, &created.id).await.unwrap();
        assert_eq!(deleted, created);

        assert!(service.get(&ctx, &created.id).await.unwrap().is_none());

        let err = service.delete(&ctx, &created.id).await.unwrap_err();
        assert_eq!(err, ServiceError::not_found("account", created.id.as_str()));
    }

    // ============== Context ==============

    #[tokio::test]
    async fn test_cancelled_context_aborts_create() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());
        let ctx = CallContext::background();
        ctx.cancel();

        let err = service
            .create(&ctx, input("Ada", "ada@example.com", "long enough"))
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Cancelled);
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_input_debug_redacts_password() {
        let debug = format!("{:?}", input("Ada", "ada@example.com", "hunter2hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
