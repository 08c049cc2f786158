//! Composite responses
//!
//! A response is a data payload plus zero or more field errors. A nested
//! field whose dependent call failed is rendered as `null` and the failure is
//! reported at that field's path; everything else in the payload stays intact.

use chrono::{DateTime, Utc};
use rpc::{AccountDto, OrderDto, OrderedProductDto, ProductDto};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use shared::{ServiceError, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a field inside the response payload, e.g. `["accounts", 2, "orders"]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root(field: &str) -> Self {
        Self(vec![PathSegment::Field(field.to_string())])
    }

    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl core::fmt::Display for Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: Path,
    pub status: Status,
    /// Offending input field, for `invalid_input`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(path: Path, error: &ServiceError) -> Self {
        let message = match error {
            ServiceError::InvalidInput { message, .. } => message.clone(),
            other => other.public_message(),
        };
        Self {
            path,
            status: error.status(),
            field: error.field().map(str::to_string),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Response {
    /// Errors reported at exactly `path`
    pub fn errors_at(&self, path: &Path) -> Vec<&FieldError> {
        self.errors.iter().filter(|e| &e.path == path).collect()
    }
}

/// Outcome of a nested field
#[derive(Debug, Clone, PartialEq)]
pub enum Nested<T> {
    /// Not requested; omitted from the payload
    Skipped,
    Resolved(T),
    /// Dependent call failed; rendered as `null` with a field error alongside
    Failed,
}

impl<T> Nested<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Nested::Skipped)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Nested::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Nested<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nested::Resolved(value) => value.serialize(serializer),
            Nested::Skipped | Nested::Failed => serializer.serialize_none(),
        }
    }
}

// ============== Result nodes ==============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountNode {
    #[serde(flatten)]
    pub account: AccountDto,
    #[serde(skip_serializing_if = "Nested::is_skipped")]
    pub orders: Nested<Vec<OrderNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderNode {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub account_id: String,
    pub total_price: f64,
    pub products: Vec<LineNode>,
}

impl OrderNode {
    /// Node with every line's `product` left unresolved
    pub fn bare(order: OrderDto) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            account_id: order.account_id,
            total_price: order.total_price,
            products: order.products.into_iter().map(LineNode::bare).collect(),
        }
    }
}

/// One order line; `product` holds the current catalog entry when selected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineNode {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Nested::is_skipped")]
    pub product: Nested<Option<ProductDto>>,
}

impl LineNode {
    fn bare(line: OrderedProductDto) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            product: Nested::Skipped,
        }
    }
}
