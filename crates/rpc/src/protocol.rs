//! Wire protocol
//!
//! Frames are single-line JSON documents separated by `\n`. A connection
//! carries any number of in-flight requests; responses are matched to
//! requests by `id` and may arrive in any order.
//!
//! ```text
//! -> {"id":7,"method":"account.get","deadline_ms":1500,"params":{"id":"01H..."}}
//! <- {"id":7,"result":{"id":"01H...","name":"Ada","email":"ada@example.com"}}
//! <- {"id":8,"error":{"status":"not_found","message":"account '42' not found","kind":"account","id":"42"}}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{ServiceError, Status};

/// Upper bound for one frame; longer lines drop the connection
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Method names understood by the domain servers
pub mod methods {
    pub const ACCOUNT_CREATE: &str = "account.create";
    pub const ACCOUNT_GET: &str = "account.get";
    pub const ACCOUNT_LIST: &str = "account.list";
    pub const ACCOUNT_UPDATE: &str = "account.update";
    pub const ACCOUNT_DELETE: &str = "account.delete";

    pub const PRODUCT_CREATE: &str = "product.create";
    pub const PRODUCT_GET: &str = "product.get";
    pub const PRODUCT_LIST: &str = "product.list";
    pub const PRODUCT_UPDATE: &str = "product.update";
    pub const PRODUCT_DELETE: &str = "product.delete";

    pub const ORDER_CREATE: &str = "order.create";
    pub const ORDER_GET: &str = "order.get";
    pub const ORDER_LIST: &str = "order.list";
    pub const ORDER_LIST_FOR_ACCOUNT: &str = "order.list_for_account";
    pub const ORDER_UPDATE: &str = "order.update";
    pub const ORDER_DELETE: &str = "order.delete";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    /// Time the caller is still willing to wait, relative to send time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl Response {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: &ServiceError) -> Self {
        Self {
            id,
            result: None,
            error: Some(WireError::from(error)),
        }
    }

    pub fn into_result(self) -> Result<Value, ServiceError> {
        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Error body of a failed response.
///
/// Carries enough structure to rebuild the same [`ServiceError`] variant on
/// the calling side. Internal failures only ever travel as "internal error".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl From<&ServiceError> for WireError {
    fn from(error: &ServiceError) -> Self {
        let mut wire = WireError {
            status: error.status(),
            message: error.public_message(),
            field: None,
            kind: None,
            id: None,
        };
        match error {
            ServiceError::InvalidInput { field, message } => {
                wire.field = Some(field.clone());
                wire.message = message.clone();
            }
            ServiceError::NotFound { kind, id } => {
                wire.kind = Some(kind.clone());
                wire.id = Some(id.clone());
            }
            ServiceError::Unauthorized(message) | ServiceError::Unavailable(message) => {
                wire.message = message.clone();
            }
            _ => {}
        }
        wire
    }
}

impl From<WireError> for ServiceError {
    fn from(wire: WireError) -> Self {
        match wire.status {
            Status::InvalidInput => ServiceError::invalid(
                wire.field.unwrap_or_else(|| "request".to_string()),
                wire.message,
            ),
            Status::NotFound => ServiceError::not_found(
                wire.kind.unwrap_or_else(|| "record".to_string()),
                wire.id.unwrap_or_default(),
            ),
            Status::Unauthorized => ServiceError::Unauthorized(wire.message),
            Status::Unavailable => ServiceError::Unavailable(wire.message),
            Status::DeadlineExceeded => ServiceError::DeadlineExceeded,
            Status::Cancelled => ServiceError::Cancelled,
            Status::Internal => ServiceError::Internal(wire.message),
        }
    }
}

/// Decode request parameters; shape errors are the caller's fault
pub fn decode_params<P: DeserializeOwned>(params: Value) -> Result<P, ServiceError> {
    serde_json::from_value(params).map_err(|e| ServiceError::invalid("params", e.to_string()))
}

pub fn encode_result<R: Serialize>(value: &R) -> Result<Value, ServiceError> {
    serde_json::to_value(value)
        .map_err(|e| ServiceError::Internal(format!("failed to encode result: {}", e)))
}
