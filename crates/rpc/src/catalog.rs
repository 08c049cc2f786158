//! Catalog service over the wire

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{CatalogService, ProductInput};
use serde_json::Value;
use shared::{CallContext, PageRequest, Result, ServiceError};

use crate::api::{CatalogApi, Closeable};
use crate::client::RpcClient;
use crate::dto::{IdParams, ProductDto, ProductFields, UpdateProductParams};
use crate::protocol::{decode_params, encode_result, methods};
use crate::server::{unknown_method, RpcHandler};

#[derive(Debug, Clone)]
pub struct CatalogClient {
    rpc: RpcClient,
}

impl CatalogClient {
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::connect_with_timeout(addr, timeout).await?,
        })
    }
}

impl Closeable for CatalogClient {
    fn close(&self) {
        self.rpc.close();
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn create_product(&self, ctx: &CallContext, input: ProductInput) -> Result<ProductDto> {
        let params = ProductFields::from(input);
        self.rpc.call(ctx, methods::PRODUCT_CREATE, &params).await
    }

    async fn get_product(&self, ctx: &CallContext, id: &str) -> Result<Option<ProductDto>> {
        let params = IdParams { id: id.to_string() };
        self.rpc.call(ctx, methods::PRODUCT_GET, &params).await
    }

    async fn list_products(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<ProductDto>> {
        self.rpc.call(ctx, methods::PRODUCT_LIST, &page).await
    }

    async fn update_product(&self, ctx: &CallContext, id: &str, input: ProductInput) -> Result<ProductDto> {
        let params = UpdateProductParams {
            id: id.to_string(),
            fields: input.into(),
        };
        self.rpc.call(ctx, methods::PRODUCT_UPDATE, &params).await
    }

    async fn delete_product(&self, ctx: &CallContext, id: &str) -> Result<ProductDto> {
        let params = IdParams { id: id.to_string() };
        self.rpc.call(ctx, methods::PRODUCT_DELETE, &params).await
    }
}

/// Serves `product.*` methods from a [`CatalogService`]
pub struct CatalogHandler {
    service: Arc<CatalogService>,
}

impl CatalogHandler {
    pub fn new(service: Arc<CatalogService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RpcHandler for CatalogHandler {
    async fn handle(&self, ctx: &CallContext, method: &str, params: Value) -> std::result::Result<Value, ServiceError> {
        match method {
            methods::PRODUCT_CREATE => {
                let fields: ProductFields = decode_params(params)?;
                let product = self.service.create(ctx, fields.into()).await?;
                encode_result(&ProductDto::from(product))
            }
            methods::PRODUCT_GET => {
                let params: IdParams = decode_params(params)?;
                let product = self.service.get(ctx, &params.id).await?;
                encode_result(&product.map(ProductDto::from))
            }
            methods::PRODUCT_LIST => {
                let page: PageRequest = decode_params(params)?;
                let products = self.service.list(ctx, page).await?;
                encode_result(&products.into_iter().map(ProductDto::from).collect::<Vec<_>>())
            }
            methods::PRODUCT_UPDATE => {
                let params: UpdateProductParams = decode_params(params)?;
                let product = self.service.update(ctx, &params.id, params.fields.into()).await?;
                encode_result(&ProductDto::from(product))
            }
            methods::PRODUCT_DELETE => {
                let params: IdParams = decode_params(params)?;
                let product = self.service.delete(ctx, &params.id).await?;
                encode_result(&ProductDto::from(product))
            }
            other => Err(unknown_method(other)),
        }
    }
}
