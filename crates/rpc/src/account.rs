//! Account service over the wire

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{AccountInput, AccountService, AccountUpdate};
use serde_json::Value;
use shared::{CallContext, PageRequest, Result, ServiceError};

use crate::api::{AccountApi, Closeable};
use crate::client::RpcClient;
use crate::dto::{AccountDto, CreateAccountParams, IdParams, UpdateAccountParams};
use crate::protocol::{decode_params, encode_result, methods};
use crate::server::{unknown_method, RpcHandler};

/// Typed client for a remote account service
#[derive(Debug, Clone)]
pub struct AccountClient {
    rpc: RpcClient,
}

impl AccountClient {
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::connect_with_timeout(addr, timeout).await?,
        })
    }
}

impl Closeable for AccountClient {
    fn close(&self) {
        self.rpc.close();
    }
}

#[async_trait]
impl AccountApi for AccountClient {
    async fn create_account(&self, ctx: &CallContext, input: AccountInput) -> Result<AccountDto> {
        let params = CreateAccountParams::from(input);
        self.rpc.call(ctx, methods::ACCOUNT_CREATE, &params).await
    }

    async fn get_account(&self, ctx: &CallContext, id: &str) -> Result<Option<AccountDto>> {
        let params = IdParams { id: id.to_string() };
        self.rpc.call(ctx, methods::ACCOUNT_GET, &params).await
    }

    async fn list_accounts(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<AccountDto>> {
        self.rpc.call(ctx, methods::ACCOUNT_LIST, &page).await
    }

    async fn update_account(&self, ctx: &CallContext, id: &str, update: AccountUpdate) -> Result<AccountDto> {
        let params = UpdateAccountParams::new(id, update);
        self.rpc.call(ctx, methods::ACCOUNT_UPDATE, &params).await
    }

    async fn delete_account(&self, ctx: &CallContext, id: &str) -> Result<AccountDto> {
        let params = IdParams { id: id.to_string() };
        self.rpc.call(ctx, methods::ACCOUNT_DELETE, &params).await
    }
}

/// Serves `account.*` methods from an [`AccountService`]
pub struct AccountHandler {
    service: Arc<AccountService>,
}

impl AccountHandler {
    pub fn new(service: Arc<AccountService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RpcHandler for AccountHandler {
    async fn handle(&self, ctx: &CallContext, method: &str, params: Value) -> std::result::Result<Value, ServiceError> {
        match method {
            methods::ACCOUNT_CREATE => {
                let params: CreateAccountParams = decode_params(params)?;
                let account = self.service.create(ctx, params.into()).await?;
                encode_result(&AccountDto::from(&account))
            }
            methods::ACCOUNT_GET => {
                let params: IdParams = decode_params(params)?;
                let account = self.service.get(ctx, &params.id).await?;
                encode_result(&account.as_ref().map(AccountDto::from))
            }
            methods::ACCOUNT_LIST => {
                let page: PageRequest = decode_params(params)?;
                let accounts = self.service.list(ctx, page).await?;
                encode_result(&accounts.iter().map(AccountDto::from).collect::<Vec<_>>())
            }
            methods::ACCOUNT_UPDATE => {
                let (id, update) = decode_params::<UpdateAccountParams>(params)?.into_parts();
                let account = self.service.update(ctx, &id, update).await?;
                encode_result(&AccountDto::from(&account))
            }
            methods::ACCOUNT_DELETE => {
                let params: IdParams = decode_params(params)?;
                let account = self.service.delete(ctx, &params.id).await?;
                encode_result(&AccountDto::from(&account))
            }
            other => Err(unknown_method(other)),
        }
    }
}
