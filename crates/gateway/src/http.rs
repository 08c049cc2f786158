//! HTTP surface
//!
//! - `POST /query` - one [`Operation`] in, one composite [`Response`] out
//! - `GET /health` - liveness

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use shared::{CallContext, ServiceError};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::query::Operation;
use crate::resolver::Gateway;
use crate::response::{FieldError, Path, Response};

#[derive(Clone)]
struct AppState {
    gateway: Arc<Gateway>,
    request_timeout: Duration,
}

pub fn router(gateway: Arc<Gateway>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/health", get(health))
        .with_state(AppState {
            gateway,
            request_timeout,
        })
}

/// Serve `router` until `shutdown` is cancelled
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "gateway listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Every outcome, including an unreadable body, is a composite [`Response`]
async fn query(State(state): State<AppState>, body: Bytes) -> Json<Response> {
    let op: Operation = match serde_json::from_slice(&body) {
        Ok(op) => op,
        Err(e) => {
            let err = ServiceError::invalid("operation", e.to_string());
            return Json(Response {
                data: Value::Null,
                errors: vec![FieldError::new(Path::root("operation"), &err)],
            });
        }
    };

    let ctx = CallContext::with_timeout(state.request_timeout);
    Json(state.gateway.execute(&ctx, op).await)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
