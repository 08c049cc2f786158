//! PostgreSQL Store
//!
//! One connection pool serves all three record kinds. The pool is safe for
//! concurrent use; each order write runs in a transaction so its header and
//! line items change together or not at all.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Account, Order, OrderStore, OrderedProduct, Product, RepositoryError, Store};
use shared::{CallContext, PageRequest};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        account_id TEXT NOT NULL,
        total_price DOUBLE PRECISION NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS orders_account_id_idx ON orders (account_id)",
    "CREATE TABLE IF NOT EXISTS order_products (
        order_id TEXT NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        product_id TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price DOUBLE PRECISION NOT NULL,
        PRIMARY KEY (order_id, position)
    )",
];

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(e.to_string())
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and make sure the schema exists
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(storage)?;

        let store = Self { pool };
        store.ensure_schema().await?;
        info!("connected to PostgreSQL");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        }
        Ok(())
    }

    async fn close_pool(&self) {
        self.pool.close().await;
    }

    async fn load_lines(
        &self,
        order_ids: Vec<String>,
    ) -> Result<HashMap<String, Vec<OrderedProduct>>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT order_id, product_id, quantity, unit_price FROM order_products
             WHERE order_id = ANY($1) ORDER BY order_id, position",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut lines: HashMap<String, Vec<OrderedProduct>> = HashMap::new();
        for row in rows {
            let order_id: String = row.try_get("order_id").map_err(storage)?;
            let quantity: i32 = row.try_get("quantity").map_err(storage)?;
            lines.entry(order_id).or_default().push(OrderedProduct {
                product_id: row.try_get("product_id").map_err(storage)?,
                quantity: u32::try_from(quantity)
                    .map_err(|_| RepositoryError::storage("negative quantity in order_products"))?,
                unit_price: row.try_get("unit_price").map_err(storage)?,
            });
        }
        Ok(lines)
    }

    /// Attach line items to bare order rows
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = rows
            .iter()
            .map(order_header)
            .collect::<Result<Vec<_>, _>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let mut lines = self
            .load_lines(orders.iter().map(|o| o.id.clone()).collect())
            .await?;
        for order in &mut orders {
            order.products = lines.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }

    async fn put_order(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(
            "INSERT INTO orders (id, created_at, account_id, total_price) VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET account_id = EXCLUDED.account_id,
             total_price = EXCLUDED.total_price",
        )
        .bind(&order.id)
        .bind(order.created_at)
        .bind(&order.account_id)
        .bind(order.total_price)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query("DELETE FROM order_products WHERE order_id = $1")
            .bind(&order.id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        for (position, line) in order.products.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::storage("too many order lines"))?;
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| RepositoryError::storage("quantity out of range"))?;
            sqlx::query(
                "INSERT INTO order_products (order_id, position, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&order.id)
            .bind(position)
            .bind(&line.product_id)
            .bind(quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn account_row(row: &PgRow) -> Result<Account, RepositoryError> {
    Ok(Account {
        id: row.try_get("id").map_err(storage)?,
        name: row.try_get("name").map_err(storage)?,
        email: row.try_get("email").map_err(storage)?,
        password_hash: row.try_get("password_hash").map_err(storage)?,
    })
}

fn product_row(row: &PgRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row.try_get("id").map_err(storage)?,
        name: row.try_get("name").map_err(storage)?,
        description: row.try_get("description").map_err(storage)?,
        price: row.try_get("price").map_err(storage)?,
    })
}

fn order_header(row: &PgRow) -> Result<Order, RepositoryError> {
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage)?;
    Ok(Order {
        id: row.try_get("id").map_err(storage)?,
        created_at,
        account_id: row.try_get("account_id").map_err(storage)?,
        total_price: row.try_get("total_price").map_err(storage)?,
        products: Vec::new(),
    })
}

#[async_trait]
impl Store<Account> for PostgresStore {
    async fn close(&self) {
        self.close_pool().await;
    }

    async fn put(&self, ctx: &CallContext, account: Account) -> Result<(), RepositoryError> {
        let query = sqlx::query(
            "INSERT INTO accounts (id, name, email, password_hash) VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email,
             password_hash = EXCLUDED.password_hash",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .execute(&self.pool);

        ctx.run(query).await?.map_err(storage)?;
        Ok(())
    }

    async fn get_by_id(&self, ctx: &CallContext, id: &str) -> Result<Option<Account>, RepositoryError> {
        let query = sqlx::query("SELECT id, name, email, password_hash FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool);

        let row = ctx.run(query).await?.map_err(storage)?;
        row.as_ref().map(account_row).transpose()
    }

    async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<Account>, RepositoryError> {
        let query = sqlx::query(
            "SELECT id, name, email, password_hash FROM accounts ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(to_i64(page.skip))
        .bind(to_i64(page.take))
        .fetch_all(&self.pool);

        let rows = ctx.run(query).await?.map_err(storage)?;
        rows.iter().map(account_row).collect()
    }

    async fn delete(&self, ctx: &CallContext, id: &str) -> Result<(), RepositoryError> {
        let query = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool);

        ctx.run(query).await?.map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl Store<Product> for PostgresStore {
    async fn close(&self) {
        self.close_pool().await;
    }

    async fn put(&self, ctx: &CallContext, product: Product) -> Result<(), RepositoryError> {
        let query = sqlx::query(
            "INSERT INTO products (id, name, description, price) VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name,
             description = EXCLUDED.description, price = EXCLUDED.price",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .execute(&self.pool);

        ctx.run(query).await?.map_err(storage)?;
        Ok(())
    }

    async fn get_by_id(&self, ctx: &CallContext, id: &str) -> Result<Option<Product>, RepositoryError> {
        let query = sqlx::query("SELECT id, name, description, price FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool);

        let row = ctx.run(query).await?.map_err(storage)?;
        row.as_ref().map(product_row).transpose()
    }

    async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<Product>, RepositoryError> {
        let query = sqlx::query(
            "SELECT id, name, description, price FROM products ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(to_i64(page.skip))
        .bind(to_i64(page.take))
        .fetch_all(&self.pool);

        let rows = ctx.run(query).await?.map_err(storage)?;
        rows.iter().map(product_row).collect()
    }

    async fn delete(&self, ctx: &CallContext, id: &str) -> Result<(), RepositoryError> {
        let query = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool);

        ctx.run(query).await?.map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl Store<Order> for PostgresStore {
    async fn close(&self) {
        self.close_pool().await;
    }

    async fn put(&self, ctx: &CallContext, order: Order) -> Result<(), RepositoryError> {
        // An abandoned transaction rolls back when dropped.
        ctx.run(self.put_order(order)).await?
    }

    async fn get_by_id(&self, ctx: &CallContext, id: &str) -> Result<Option<Order>, RepositoryError> {
        let fetch = async {
            let rows = sqlx::query(
                "SELECT id, created_at, account_id, total_price FROM orders WHERE id = $1",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
            Ok::<_, RepositoryError>(self.hydrate(rows).await?.into_iter().next())
        };
        ctx.run(fetch).await?
    }

    async fn list(&self, ctx: &CallContext, page: PageRequest) -> Result<Vec<Order>, RepositoryError> {
        let fetch = async {
            let rows = sqlx::query(
                "SELECT id, created_at, account_id, total_price FROM orders
                 ORDER BY id OFFSET $1 LIMIT $2",
            )
            .bind(to_i64(page.skip))
            .bind(to_i64(page.take))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
            self.hydrate(rows).await
        };
        ctx.run(fetch).await?
    }

    async fn delete(&self, ctx: &CallContext, id: &str) -> Result<(), RepositoryError> {
        let query = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool);

        ctx.run(query).await?.map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn list_for_account(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<Vec<Order>, RepositoryError> {
        let fetch = async {
            let rows = sqlx::query(
                "SELECT id, created_at, account_id, total_price FROM orders
                 WHERE account_id = $1 ORDER BY id",
            )
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
            self.hydrate(rows).await
        };
        ctx.run(fetch).await?
    }
}
