//! Order service over the wire

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{OrderInput, OrderService};
use serde_json::Value;
use shared::{CallContext, PageRequest, Result, ServiceError};

use crate::api::{Closeable, OrderApi};
use crate::client::RpcClient;
use crate::dto::{AccountIdParams, IdParams, OrderDto, OrderFields, UpdateOrderParams};
use crate::protocol::{decode_params, encode_result, methods};
use crate::server::{unknown_method, RpcHandler};

#[derive(Debug, Clone)]
pub struct OrderClient {
    rpc: RpcClient,
}

impl OrderClient {
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::connect_with_timeout(addr, timeout).await?,
        })
    }
}

impl Closeable for OrderClient {
    fn close(&self) {
        self.rpc.close();
    }
}

#[async_trait]
impl OrderApi for OrderClient {
    async fn create_order(&self, ctx: &CallContext, input: OrderInput) -> Result<OrderDto> {
        let params = OrderFields::from(input);
        self.rpc.call(ctx, methods::ORDER_CREATE, &params).await
    }

    async fn get_order(&self, ctx: &CallContext, id: &str) -> Result<Option<OrderDto>> {
        let params = IdParams { id: id.to_string() };
        self.rpc.call(ctx, methods::ORDER_GET, &params).await
    }

    async fn list_orders(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<OrderDto>> {
        self.rpc.call(ctx, methods::ORDER_LIST, &page).await
    }

    async fn list_orders_for_account(&self, ctx: &CallContext, account_id: &str) -> Result<Vec<OrderDto>> {
        let params = AccountIdParams {
            account_id: account_id.to_string(),
        };
        self.rpc.call(ctx, methods::ORDER_LIST_FOR_ACCOUNT, &params).await
    }

    async fn update_order(&self, ctx: &CallContext, id: &str, input: OrderInput) -> Result<OrderDto> {
        let params = UpdateOrderParams {
            id: id.to_string(),
            fields: input.into(),
        };
        self.rpc.call(ctx, methods::ORDER_UPDATE, &params).await
    }

    async fn delete_order(&self, ctx: &CallContext, id: &str) -> Result<OrderDto> {
        let params = IdParams { id: id.to_string() };
        self.rpc.call(ctx, methods::ORDER_DELETE, &params).await
    }
}

/// Serves `order.*` methods from an [`OrderService`]
pub struct OrderHandler {
    service: Arc<OrderService>,
}

impl OrderHandler {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }
}

fn encode_orders(orders: Vec<domain::Order>) -> std::result::Result<Value, ServiceError> {
    encode_result(&orders.into_iter().map(OrderDto::from).collect::<Vec<_>>())
}

#[async_trait]
impl RpcHandler for OrderHandler {
    async fn handle(&self, ctx: &CallContext, method: &str, params: Value) -> std::result::Result<Value, ServiceError> {
        match method {
            methods::ORDER_CREATE => {
                let fields: OrderFields = decode_params(params)?;
                let order = self.service.create(ctx, fields.into()).await?;
                encode_result(&OrderDto::from(order))
            }
            methods::ORDER_GET => {
                let params: IdParams = decode_params(params)?;
                let order = self.service.get(ctx, &params.id).await?;
                encode_result(&order.map(OrderDto::from))
            }
            methods::ORDER_LIST => {
                let page: PageRequest = decode_params(params)?;
                encode_orders(self.service.list(ctx, page).await?)
            }
            methods::ORDER_LIST_FOR_ACCOUNT => {
                let params: AccountIdParams = decode_params(params)?;
                encode_orders(self.service.list_for_account(ctx, &params.account_id).await?)
            }
            methods::ORDER_UPDATE => {
                let params: UpdateOrderParams = decode_params(params)?;
                let order = self.service.update(ctx, &params.id, params.fields.into()).await?;
                encode_result(&OrderDto::from(order))
            }
            methods::ORDER_DELETE => {
                let params: IdParams = decode_params(params)?;
                let order = self.service.delete(ctx, &params.id).await?;
                encode_result(&OrderDto::from(order))
            }
            other => Err(unknown_method(other)),
        }
    }
}
