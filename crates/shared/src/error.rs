//! Error taxonomy for ProtoGraph
//!
//! Every failure that crosses a component boundary is expressed as a
//! [`ServiceError`]. The wire layer only ever sees its [`Status`] category
//! plus a caller-safe message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status category of a failed call, as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    InvalidInput,
    NotFound,
    Unauthorized,
    Unavailable,
    DeadlineExceeded,
    Cancelled,
    Internal,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InvalidInput => "invalid_input",
            Status::NotFound => "not_found",
            Status::Unauthorized => "unauthorized",
            Status::Unavailable => "unavailable",
            Status::DeadlineExceeded => "deadline_exceeded",
            Status::Cancelled => "cancelled",
            Status::Internal => "internal",
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General ProtoGraph error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Caller-correctable input problem on a named field
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A referenced id does not resolve to a record
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Transport or connection-establishment failure (retryable)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("call cancelled")]
    Cancelled,

    /// Storage or unexpected failure. The message is never sent to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            ServiceError::InvalidInput { .. } => Status::InvalidInput,
            ServiceError::NotFound { .. } => Status::NotFound,
            ServiceError::Unauthorized(_) => Status::Unauthorized,
            ServiceError::Unavailable(_) => Status::Unavailable,
            ServiceError::DeadlineExceeded => Status::DeadlineExceeded,
            ServiceError::Cancelled => Status::Cancelled,
            ServiceError::Internal(_) => Status::Internal,
        }
    }

    /// Name of the offending field for `InvalidInput`
    pub fn field(&self) -> Option<&str> {
        match self {
            ServiceError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Message that may be shown to a remote caller.
    ///
    /// Internal details are replaced by a fixed string.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Unavailable(_) | ServiceError::DeadlineExceeded
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
