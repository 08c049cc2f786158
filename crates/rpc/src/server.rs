//! RPC Server
//!
//! Accepts TCP connections and serves newline-delimited request frames.
//! Each request runs on its own task under a [`CallContext`] built from the
//! caller's deadline; a connection that goes away cancels whatever it still
//! had in flight.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use shared::{CallContext, ServiceError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::protocol::{Request, Response, MAX_FRAME_LEN};

/// Method dispatch for one domain service
#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn handle(&self, ctx: &CallContext, method: &str, params: Value) -> Result<Value, ServiceError>;
}

pub(crate) fn unknown_method(method: &str) -> ServiceError {
    ServiceError::invalid("method", format!("unknown method '{}'", method))
}

/// Number of connections currently being served
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
}

impl ConnectionTracker {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    fn enter(&self) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        ConnectionGuard {
            active: Arc::clone(&self.active),
        }
    }
}

struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct RpcServer {
    listener: TcpListener,
    handler: Arc<dyn RpcHandler>,
    connections: ConnectionTracker,
    shutdown: CancellationToken,
}

impl RpcServer {
    pub async fn bind(addr: &str, handler: Arc<dyn RpcHandler>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            handler,
            connections: ConnectionTracker::default(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn connections(&self) -> ConnectionTracker {
        self.connections.clone()
    }

    /// Cancelling this token stops accepting and drops open connections
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn serve(self) -> std::io::Result<()> {
        info!(addr = %self.listener.local_addr()?, "rpc server listening");

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!(%peer, error = %e, "could not disable nagle");
            }

            debug!(%peer, "connection accepted");
            let guard = self.connections.enter();
            let handler = Arc::clone(&self.handler);
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                let _guard = guard;
                serve_connection(stream, handler, shutdown).await;
                debug!(%peer, "connection closed");
            });
        }

        info!("rpc server stopped");
        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, handler: Arc<dyn RpcHandler>, shutdown: CancellationToken) {
    let (read, write) = stream.into_split();
    let mut frames = FramedRead::new(read, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
    let (tx, mut rx) = mpsc::channel::<Response>(64);

    let writer = tokio::spawn(async move {
        let mut sink = FramedWrite::new(write, LinesCodec::new());
        while let Some(response) = rx.recv().await {
            let line = match serde_json::to_string(&response) {
                Ok(line) => line,
                Err(e) => {
                    error!(id = response.id, error = %e, "failed to encode response");
                    continue;
                }
            };
            if let Err(e) = sink.send(line).await {
                debug!(error = %e, "peer stopped reading");
                break;
            }
        }
    });

    // Parent of every request context on this connection
    let connection = CallContext::background();

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = frames.next() => frame,
        };
        let line = match frame {
            None => break,
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!(error = %e, "dropping connection after unreadable frame");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                let rejection = ServiceError::invalid("frame", e.to_string());
                if tx.send(Response::failure(0, &rejection)).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let ctx = match request.deadline_ms {
            Some(ms) => connection.child_with_timeout(Duration::from_millis(ms)),
            None => connection.child(),
        };
        let handler = Arc::clone(&handler);
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = dispatch(handler.as_ref(), &ctx, request).await;
            if tx.send(response).await.is_err() {
                debug!("connection gone before response was written");
            }
        });
    }

    connection.cancel();
    drop(tx);
    if let Err(e) = writer.await {
        warn!(error = %e, "response writer failed");
    }
}

async fn dispatch(handler: &dyn RpcHandler, ctx: &CallContext, request: Request) -> Response {
    let Request { id, method, params, .. } = request;
    debug!(id, %method, "rpc request");

    let outcome = match ctx.run(handler.handle(ctx, &method, params)).await {
        Ok(outcome) => outcome,
        Err(interrupted) => Err(interrupted.into()),
    };

    match outcome {
        Ok(value) => Response::success(id, value),
        Err(err) => {
            if let ServiceError::Internal(detail) = &err {
                error!(id, %method, %detail, "request failed");
            } else {
                debug!(id, %method, status = %err.status(), "request rejected");
            }
            Response::failure(id, &err)
        }
    }
}
