//! Gateway - resolves composite operations against the backends
//!
//! A primary call failing fails the whole operation. Nested fields are
//! resolved only after their parent, concurrently with each other, each under
//! its own timeout; a nested failure degrades that field alone.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;

use domain::{AccountInput, AccountUpdate, OrderInput, OrderedProduct, ProductInput};
use futures::future::join_all;
use rpc::{AccountDto, OrderDto, ProductDto};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::{CallContext, GatewaySettings, PageRequest, Result, ServiceError};
use tracing::{debug, error, info, warn};

use crate::backends::Backends;
use crate::query::{AccountSelection, LineRequest, Operation, OrderSelection};
use crate::response::{AccountNode, FieldError, Nested, OrderNode, Path, Response};

pub const DEFAULT_NESTED_TIMEOUT: Duration = Duration::from_secs(2);

/// Run `fut` under `ctx`, folding an interruption into the call's own error
async fn within<T, F>(ctx: &CallContext, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    ctx.run(fut).await.unwrap_or_else(|interrupted| Err(interrupted.into()))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ServiceError::Internal(format!("failed to encode response: {}", e)))
}

pub struct Gateway {
    backends: Backends,
    nested_timeout: Duration,
}

impl Gateway {
    /// Connect every backend named in `settings`; nothing stays open on failure
    pub async fn connect(settings: &GatewaySettings) -> Result<Self> {
        let backends = Backends::connect(&settings.backends, settings.connect_timeout()).await?;
        info!("gateway connected to all backends");
        Ok(Self::from_backends(backends).with_nested_timeout(settings.nested_timeout()))
    }

    pub fn from_backends(backends: Backends) -> Self {
        Self {
            backends,
            nested_timeout: DEFAULT_NESTED_TIMEOUT,
        }
    }

    /// Builder: set the per-field timeout for nested calls
    pub fn with_nested_timeout(mut self, timeout: Duration) -> Self {
        self.nested_timeout = timeout;
        self
    }

    pub fn close(&self) {
        self.backends.close();
        info!("gateway backends closed");
    }

    fn nested_ctx(&self, ctx: &CallContext) -> CallContext {
        ctx.child_with_timeout(self.nested_timeout)
    }

    /// Resolve one operation into a composite response
    pub async fn execute(&self, ctx: &CallContext, op: Operation) -> Response {
        let name = op.name();
        if op.is_mutation() {
            info!(op = name, "executing mutation");
        } else {
            debug!(op = name, "executing query");
        }

        let root = Path::root(name);
        let mut errors = Vec::new();
        let outcome = self.dispatch(ctx, op, &root, &mut errors).await;

        let mut data = Map::new();
        match outcome {
            Ok(value) => {
                data.insert(name.to_string(), value);
            }
            Err(err) => {
                if let ServiceError::Internal(detail) = &err {
                    error!(op = name, %detail, "operation failed");
                } else {
                    debug!(op = name, status = %err.status(), "operation rejected");
                }
                data.insert(name.to_string(), Value::Null);
                errors.push(FieldError::new(root, &err));
            }
        }
        Response {
            data: Value::Object(data),
            errors,
        }
    }

    async fn dispatch(
        &self,
        ctx: &CallContext,
        op: Operation,
        root: &Path,
        errors: &mut Vec<FieldError>,
    ) -> Result<Value> {
        match op {
            Operation::Account { id, select } => {
                let account = self.account(ctx, &id, &select, root, errors).await?;
                to_value(&account)
            }
            Operation::Accounts { page, select } => {
                let accounts = self.accounts(ctx, page, &select, root, errors).await?;
                to_value(&accounts)
            }
            Operation::Product { id } => to_value(&self.product(ctx, &id).await?),
            Operation::Products { page } => to_value(&self.products(ctx, page).await?),
            Operation::Order { id, select } => {
                let order = self.order(ctx, &id, &select, root, errors).await?;
                to_value(&order)
            }
            Operation::CreateAccount {
                name,
                email,
                password,
            } => {
                let input = AccountInput {
                    name,
                    email,
                    password,
                };
                to_value(&self.backends.account.create_account(ctx, input).await?)
            }
            Operation::UpdateAccount {
                id,
                name,
                email,
                password,
            } => {
                let update = AccountUpdate {
                    name,
                    email,
                    password,
                };
                to_value(&self.backends.account.update_account(ctx, &id, update).await?)
            }
            Operation::DeleteAccount { id } => {
                to_value(&self.backends.account.delete_account(ctx, &id).await?)
            }
            Operation::CreateProduct {
                name,
                description,
                price,
            } => {
                let input = ProductInput {
                    name,
                    description,
                    price,
                };
                to_value(&self.backends.catalog.create_product(ctx, input).await?)
            }
            Operation::UpdateProduct {
                id,
                name,
                description,
                price,
            } => {
                let input = ProductInput {
                    name,
                    description,
                    price,
                };
                to_value(&self.backends.catalog.update_product(ctx, &id, input).await?)
            }
            Operation::DeleteProduct { id } => {
                to_value(&self.backends.catalog.delete_product(ctx, &id).await?)
            }
            Operation::CreateOrder {
                account_id,
                products,
            } => to_value(&self.create_order(ctx, account_id, products).await?),
            Operation::UpdateOrder {
                id,
                account_id,
                products,
            } => to_value(&self.update_order(ctx, &id, account_id, products).await?),
            Operation::DeleteOrder { id } => {
                to_value(&self.backends.order.delete_order(ctx, &id).await?)
            }
        }
    }

    // ============== Queries ==============

    pub async fn account(
        &self,
        ctx: &CallContext,
        id: &str,
        select: &AccountSelection,
        path: &Path,
        errors: &mut Vec<FieldError>,
    ) -> Result<Option<AccountNode>> {
        let Some(account) = self.backends.account.get_account(ctx, id).await? else {
            return Ok(None);
        };
        let mut nodes = self
            .account_nodes(ctx, vec![(path.clone(), account)], select, errors)
            .await;
        Ok(nodes.pop())
    }

    pub async fn accounts(
        &self,
        ctx: &CallContext,
        page: PageRequest,
        select: &AccountSelection,
        path: &Path,
        errors: &mut Vec<FieldError>,
    ) -> Result<Vec<AccountNode>> {
        let accounts = self.backends.account.list_accounts(ctx, page).await?;
        let located = accounts
            .into_iter()
            .enumerate()
            .map(|(i, account)| (path.index(i), account))
            .collect();
        Ok(self.account_nodes(ctx, located, select, errors).await)
    }

    pub async fn product(&self, ctx: &CallContext, id: &str) -> Result<Option<ProductDto>> {
        self.backends.catalog.get_product(ctx, id).await
    }

    pub async fn products(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<ProductDto>> {
        self.backends.catalog.list_products(ctx, page).await
    }

    pub async fn order(
        &self,
        ctx: &CallContext,
        id: &str,
        select: &OrderSelection,
        path: &Path,
        errors: &mut Vec<FieldError>,
    ) -> Result<Option<OrderNode>> {
        let Some(order) = self.backends.order.get_order(ctx, id).await? else {
            return Ok(None);
        };
        let mut nodes = self
            .order_nodes(ctx, vec![(path.clone(), order)], select, errors)
            .await;
        Ok(nodes.pop())
    }

    // ============== Nested fields ==============

    /// Attach `orders` to each account, one concurrent lookup per account
    async fn account_nodes(
        &self,
        ctx: &CallContext,
        accounts: Vec<(Path, AccountDto)>,
        select: &AccountSelection,
        errors: &mut Vec<FieldError>,
    ) -> Vec<AccountNode> {
        let Some(order_select) = &select.orders else {
            return accounts
                .into_iter()
                .map(|(_, account)| AccountNode {
                    account,
                    orders: Nested::Skipped,
                })
                .collect();
        };

        let lookups = accounts.iter().map(|(_, account)| {
            let nested = self.nested_ctx(ctx);
            let orders = &self.backends.order;
            async move { within(&nested, orders.list_orders_for_account(&nested, &account.id)).await }
        });
        let results = join_all(lookups).await;

        // Orders of all accounts share one product fan-out
        let mut located_orders = Vec::new();
        let mut owners = Vec::with_capacity(accounts.len());
        for ((path, account), result) in accounts.into_iter().zip(results) {
            let orders_path = path.field("orders");
            match result {
                Ok(orders) => {
                    let count = orders.len();
                    located_orders.extend(
                        orders
                            .into_iter()
                            .enumerate()
                            .map(|(i, order)| (orders_path.index(i), order)),
                    );
                    owners.push((account, Some(count)));
                }
                Err(err) => {
                    warn!(account_id = %account.id, error = %err, "orders unavailable for account");
                    errors.push(FieldError::new(orders_path, &err));
                    owners.push((account, None));
                }
            }
        }

        let mut order_nodes = self
            .order_nodes(ctx, located_orders, order_select, errors)
            .await
            .into_iter();
        owners
            .into_iter()
            .map(|(account, count)| {
                let orders = match count {
                    Some(count) => Nested::Resolved(order_nodes.by_ref().take(count).collect()),
                    None => Nested::Failed,
                };
                AccountNode { account, orders }
            })
            .collect()
    }

    /// Attach the current catalog entry to each order line.
    ///
    /// Each distinct product is fetched once, concurrently.
    async fn order_nodes(
        &self,
        ctx: &CallContext,
        orders: Vec<(Path, OrderDto)>,
        select: &OrderSelection,
        errors: &mut Vec<FieldError>,
    ) -> Vec<OrderNode> {
        let mut nodes: Vec<(Path, OrderNode)> = orders
            .into_iter()
            .map(|(path, order)| (path, OrderNode::bare(order)))
            .collect();
        if !select.products {
            return nodes.into_iter().map(|(_, node)| node).collect();
        }

        let product_ids: BTreeSet<String> = nodes
            .iter()
            .flat_map(|(_, node)| node.products.iter().map(|line| line.product_id.clone()))
            .collect();
        let lookups = product_ids.into_iter().map(|id| {
            let nested = self.nested_ctx(ctx);
            let catalog = &self.backends.catalog;
            async move {
                let result = within(&nested, catalog.get_product(&nested, &id)).await;
                (id, result)
            }
        });
        let products: HashMap<String, Result<Option<ProductDto>>> =
            join_all(lookups).await.into_iter().collect();

        for (path, node) in &mut nodes {
            for (i, line) in node.products.iter_mut().enumerate() {
                line.product = match products.get(&line.product_id) {
                    Some(Ok(product)) => Nested::Resolved(product.clone()),
                    Some(Err(err)) => {
                        let line_path = path.field("products").index(i).field("product");
                        warn!(product_id = %line.product_id, error = %err, "product unavailable for order line");
                        errors.push(FieldError::new(line_path, err));
                        Nested::Failed
                    }
                    None => Nested::Resolved(None),
                };
            }
        }
        nodes.into_iter().map(|(_, node)| node).collect()
    }

    // ============== Mutations ==============

    pub async fn create_order(
        &self,
        ctx: &CallContext,
        account_id: String,
        lines: Vec<LineRequest>,
    ) -> Result<OrderDto> {
        let input = self.priced_order(ctx, account_id, lines).await?;
        self.backends.order.create_order(ctx, input).await
    }

    pub async fn update_order(
        &self,
        ctx: &CallContext,
        id: &str,
        account_id: String,
        lines: Vec<LineRequest>,
    ) -> Result<OrderDto> {
        let input = self.priced_order(ctx, account_id, lines).await?;
        self.backends.order.update_order(ctx, id, input).await
    }

    /// Check the account exists and snapshot current catalog prices, concurrently
    async fn priced_order(
        &self,
        ctx: &CallContext,
        account_id: String,
        lines: Vec<LineRequest>,
    ) -> Result<OrderInput> {
        if lines.is_empty() {
            return Err(ServiceError::invalid("products", "an order needs at least one product"));
        }

        let product_ids: BTreeSet<&str> = lines.iter().map(|line| line.product_id.as_str()).collect();
        let price_lookups = join_all(product_ids.into_iter().map(|id| async move {
            let product = self.backends.catalog.get_product(ctx, id).await;
            (id, product)
        }));
        let account_lookup = self.backends.account.get_account(ctx, &account_id);
        let (account, priced) = futures::join!(account_lookup, price_lookups);

        if account?.is_none() {
            return Err(ServiceError::invalid(
                "account_id",
                format!("unknown account '{}'", account_id),
            ));
        }
        let mut prices = HashMap::new();
        for (id, product) in priced {
            if let Some(product) = product? {
                prices.insert(id, product.price);
            }
        }

        let mut products = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let Some(&unit_price) = prices.get(line.product_id.as_str()) else {
                return Err(ServiceError::invalid(
                    format!("products[{}].product_id", i),
                    format!("unknown product '{}'", line.product_id),
                ));
            };
            products.push(OrderedProduct {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price,
            });
        }
        Ok(OrderInput {
            account_id,
            products,
        })
    }
}
