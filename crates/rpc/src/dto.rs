//! Wire messages
//!
//! Records as they cross the boundary. `AccountDto` deliberately has no
//! credential field, so a stored hash can never be serialized to a caller.

use chrono::{DateTime, Utc};
use domain::{Account, AccountInput, AccountUpdate, Order, OrderInput, OrderedProduct, Product, ProductInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDto {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&Account> for AccountDto {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedProductDto {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl From<OrderedProduct> for OrderedProductDto {
    fn from(line: OrderedProduct) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

impl From<OrderedProductDto> for OrderedProduct {
    fn from(line: OrderedProductDto) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub account_id: String,
    pub total_price: f64,
    pub products: Vec<OrderedProductDto>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            account_id: order.account_id,
            total_price: order.total_price,
            products: order.products.into_iter().map(Into::into).collect(),
        }
    }
}

// ============== Request parameters ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdParams {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdParams {
    pub account_id: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CreateAccountParams {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for CreateAccountParams {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CreateAccountParams")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<AccountInput> for CreateAccountParams {
    fn from(input: AccountInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            password: input.password,
        }
    }
}

impl From<CreateAccountParams> for AccountInput {
    fn from(params: CreateAccountParams) -> Self {
        Self {
            name: params.name,
            email: params.email,
            password: params.password,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct UpdateAccountParams {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl core::fmt::Debug for UpdateAccountParams {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpdateAccountParams")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl UpdateAccountParams {
    pub fn new(id: &str, update: AccountUpdate) -> Self {
        Self {
            id: id.to_string(),
            name: update.name,
            email: update.email,
            password: update.password,
        }
    }

    pub fn into_parts(self) -> (String, AccountUpdate) {
        let update = AccountUpdate {
            name: self.name,
            email: self.email,
            password: self.password,
        };
        (self.id, update)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
}

impl From<ProductInput> for ProductFields {
    fn from(input: ProductInput) -> Self {
        Self {
            name: input.name,
            description: input.description,
            price: input.price,
        }
    }
}

impl From<ProductFields> for ProductInput {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            price: fields.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductParams {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFields {
    pub account_id: String,
    pub products: Vec<OrderedProductDto>,
}

impl From<OrderInput> for OrderFields {
    fn from(input: OrderInput) -> Self {
        Self {
            account_id: input.account_id,
            products: input.products.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OrderFields> for OrderInput {
    fn from(fields: OrderFields) -> Self {
        Self {
            account_id: fields.account_id,
            products: fields.products.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrderParams {
    pub id: String,
    #[serde(flatten)]
    pub fields: OrderFields,
}
