//! In-process doubles for the backend APIs

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use domain::{AccountInput, AccountUpdate, Order, OrderInput, ProductInput};
use rpc::{
    AccountApi, AccountDto, CatalogApi, Closeable, OrderApi, OrderDto, OrderedProductDto, ProductDto,
};
use shared::{CallContext, PageRequest, Result, ServiceError};

use crate::backends::Backends;
use crate::resolver::Gateway;

pub(crate) fn account(id: &str, name: &str) -> AccountDto {
    AccountDto {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

pub(crate) fn product(id: &str, price: f64) -> ProductDto {
    ProductDto {
        id: id.to_string(),
        name: format!("product {}", id),
        description: String::new(),
        price,
    }
}

pub(crate) fn order(id: &str, account_id: &str, lines: &[(&str, u32, f64)]) -> OrderDto {
    let products: Vec<OrderedProductDto> = lines
        .iter()
        .map(|(product_id, quantity, unit_price)| OrderedProductDto {
            product_id: product_id.to_string(),
            quantity: *quantity,
            unit_price: *unit_price,
        })
        .collect();
    OrderDto {
        id: id.to_string(),
        created_at: Utc::now(),
        account_id: account_id.to_string(),
        total_price: products
            .iter()
            .map(|line| f64::from(line.quantity) * line.unit_price)
            .sum(),
        products,
    }
}

fn page_of<T: Clone>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    let take = if page.take == 0 { usize::MAX } else { page.take as usize };
    items.skip(page.skip as usize).take(take).collect()
}

// ============== Accounts ==============

#[derive(Default)]
pub(crate) struct FakeAccounts {
    pub accounts: Mutex<BTreeMap<String, AccountDto>>,
    pub closes: AtomicUsize,
}

impl FakeAccounts {
    pub fn with(accounts: Vec<AccountDto>) -> Self {
        let fake = Self::default();
        {
            let mut stored = fake.accounts.lock().unwrap();
            for account in accounts {
                stored.insert(account.id.clone(), account);
            }
        }
        fake
    }
}

impl Closeable for FakeAccounts {
    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountApi for FakeAccounts {
    async fn create_account(&self, _ctx: &CallContext, input: AccountInput) -> Result<AccountDto> {
        let mut accounts = self.accounts.lock().unwrap();
        let created = AccountDto {
            id: format!("acc-{}", accounts.len() + 1),
            name: input.name,
            email: input.email,
        };
        accounts.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_account(&self, _ctx: &CallContext, id: &str) -> Result<Option<AccountDto>> {
        Ok(self.accounts.lock().unwrap().get(id).cloned())
    }

    async fn list_accounts(&self, _ctx: &CallContext, page: PageRequest) -> Result<Vec<AccountDto>> {
        Ok(page_of(self.accounts.lock().unwrap().values().cloned(), page))
    }

    async fn update_account(&self, _ctx: &CallContext, id: &str, update: AccountUpdate) -> Result<AccountDto> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| ServiceError::not_found("account", id))?;
        account.name = update.name;
        account.email = update.email;
        Ok(account.clone())
    }

    async fn delete_account(&self, _ctx: &CallContext, id: &str) -> Result<AccountDto> {
        self.accounts
            .lock()
            .unwrap()
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("account", id))
    }
}

// ============== Catalog ==============

#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub products: Mutex<BTreeMap<String, ProductDto>>,
    /// Product ids whose lookup fails as if the catalog were unreachable
    pub failing: Mutex<HashSet<String>>,
    pub lookups: AtomicUsize,
    pub closes: AtomicUsize,
}

impl FakeCatalog {
    pub fn with(products: Vec<ProductDto>) -> Self {
        let fake = Self::default();
        {
            let mut stored = fake.products.lock().unwrap();
            for product in products {
                stored.insert(product.id.clone(), product);
            }
        }
        fake
    }

    pub fn fail_lookup(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }
}

impl Closeable for FakeCatalog {
    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn create_product(&self, _ctx: &CallContext, input: ProductInput) -> Result<ProductDto> {
        let mut products = self.products.lock().unwrap();
        let created = ProductDto {
            id: format!("prod-{}", products.len() + 1),
            name: input.name,
            description: input.description,
            price: input.price,
        };
        products.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_product(&self, _ctx: &CallContext, id: &str) -> Result<Option<ProductDto>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(id) {
            return Err(ServiceError::Unavailable("catalog unreachable".to_string()));
        }
        Ok(self.products.lock().unwrap().get(id).cloned())
    }

    async fn list_products(&self, _ctx: &CallContext, page: PageRequest) -> Result<Vec<ProductDto>> {
        Ok(page_of(self.products.lock().unwrap().values().cloned(), page))
    }

    async fn update_product(&self, _ctx: &CallContext, id: &str, input: ProductInput) -> Result<ProductDto> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .get_mut(id)
            .ok_or_else(|| ServiceError::not_found("product", id))?;
        product.name = input.name;
        product.description = input.description;
        product.price = input.price;
        Ok(product.clone())
    }

    async fn delete_product(&self, _ctx: &CallContext, id: &str) -> Result<ProductDto> {
        self.products
            .lock()
            .unwrap()
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("product", id))
    }
}

// ============== Orders ==============

#[derive(Default)]
pub(crate) struct FakeOrders {
    pub orders: Mutex<Vec<OrderDto>>,
    /// Accounts whose order lookup never answers
    pub stalled: Mutex<HashSet<String>>,
    /// Accounts whose order lookup fails with a storage error
    pub broken: Mutex<HashSet<String>>,
    pub created: Mutex<Vec<OrderInput>>,
    pub closes: AtomicUsize,
}

impl FakeOrders {
    pub fn with(orders: Vec<OrderDto>) -> Self {
        let fake = Self::default();
        *fake.orders.lock().unwrap() = orders;
        fake
    }

    pub fn stall(&self, account_id: &str) {
        self.stalled.lock().unwrap().insert(account_id.to_string());
    }

    pub fn break_for(&self, account_id: &str) {
        self.broken.lock().unwrap().insert(account_id.to_string());
    }

    fn store(&self, id: String, input: OrderInput) -> OrderDto {
        let total_price = Order::compute_total(&input.products);
        let created = OrderDto {
            id,
            created_at: Utc::now(),
            account_id: input.account_id.clone(),
            total_price,
            products: input.products.iter().cloned().map(Into::into).collect(),
        };
        self.created.lock().unwrap().push(input);
        let mut orders = self.orders.lock().unwrap();
        orders.retain(|order| order.id != created.id);
        orders.push(created.clone());
        created
    }
}

impl Closeable for FakeOrders {
    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderApi for FakeOrders {
    async fn create_order(&self, _ctx: &CallContext, input: OrderInput) -> Result<OrderDto> {
        let id = format!("ord-{}", self.orders.lock().unwrap().len() + 1);
        Ok(self.store(id, input))
    }

    async fn get_order(&self, _ctx: &CallContext, id: &str) -> Result<Option<OrderDto>> {
        Ok(self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, _ctx: &CallContext, page: PageRequest) -> Result<Vec<OrderDto>> {
        Ok(page_of(self.orders.lock().unwrap().iter().cloned(), page))
    }

    async fn list_orders_for_account(&self, _ctx: &CallContext, account_id: &str) -> Result<Vec<OrderDto>> {
        let stalled = self.stalled.lock().unwrap().contains(account_id);
        if stalled {
            std::future::pending::<()>().await;
        }
        if self.broken.lock().unwrap().contains(account_id) {
            return Err(ServiceError::Internal("orders table locked".to_string()));
        }
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn update_order(&self, _ctx: &CallContext, id: &str, input: OrderInput) -> Result<OrderDto> {
        let exists = self.orders.lock().unwrap().iter().any(|o| o.id == id);
        if !exists {
            return Err(ServiceError::not_found("order", id));
        }
        Ok(self.store(id.to_string(), input))
    }

    async fn delete_order(&self, _ctx: &CallContext, id: &str) -> Result<OrderDto> {
        let mut orders = self.orders.lock().unwrap();
        let position = orders
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| ServiceError::not_found("order", id))?;
        Ok(orders.remove(position))
    }
}

pub(crate) struct Fixture {
    pub gateway: Gateway,
    pub accounts: Arc<FakeAccounts>,
    pub catalog: Arc<FakeCatalog>,
    pub orders: Arc<FakeOrders>,
}

pub(crate) fn fixture(accounts: FakeAccounts, catalog: FakeCatalog, orders: FakeOrders) -> Fixture {
    let accounts = Arc::new(accounts);
    let catalog = Arc::new(catalog);
    let orders = Arc::new(orders);
    let gateway = Gateway::from_backends(Backends {
        account: accounts.clone(),
        catalog: catalog.clone(),
        order: orders.clone(),
    });
    Fixture {
        gateway,
        accounts,
        catalog,
        orders,
    }
}
