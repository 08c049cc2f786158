//! RPC Client
//!
//! One TCP connection per client, shared by every clone. Calls are
//! multiplexed: each gets a fresh id and waits on its own oneshot channel
//! while a background reader routes responses back by id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{CallContext, Result, ServiceError};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::{Request, Response, MAX_FRAME_LEN};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

type Pending = Mutex<HashMap<u64, oneshot::Sender<Response>>>;

/// Handle to a remote service connection
///
/// Cloning is cheap and shares the connection. [`RpcClient::close`] closes
/// it for every clone; dropping the last clone closes it as well.
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<Inner>,
}

struct Inner {
    addr: String,
    next_id: AtomicU64,
    pending: Pending,
    outbound: mpsc::Sender<String>,
    shutdown: CancellationToken,
}

impl Inner {
    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Response>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection_lost(&self) -> ServiceError {
        ServiceError::Unavailable(format!("connection to {} lost", self.addr))
    }

    /// Reserve the pending slot for call `id`.
    ///
    /// Shutdown is checked after the insert: the reader clears the table once
    /// on exit, so a slot added after that would never be answered.
    fn register(&self, id: u64) -> Result<(PendingSlot<'_>, oneshot::Receiver<Response>)> {
        let (tx, rx) = oneshot::channel();
        self.pending().insert(id, tx);
        let slot = PendingSlot { inner: self, id };
        if self.shutdown.is_cancelled() {
            return Err(self.connection_lost());
        }
        Ok((slot, rx))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Removes a call's pending slot when the call stops waiting for any reason
struct PendingSlot<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.inner.pending().remove(&self.id);
    }
}

impl core::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RpcClient")
            .field("addr", &self.inner.addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl RpcClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Open the connection. Any failure to reach `addr` is `Unavailable`.
    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ServiceError::Unavailable(format!(
                    "failed to connect to {}: {}",
                    addr, e
                )))
            }
            Err(_) => {
                return Err(ServiceError::Unavailable(format!(
                    "timed out connecting to {}",
                    addr
                )))
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%addr, error = %e, "could not disable nagle");
        }

        let (read, write) = stream.into_split();
        let (outbound, rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let inner = Arc::new(Inner {
            addr: addr.to_string(),
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            outbound,
            shutdown: shutdown.clone(),
        });

        tokio::spawn(write_loop(write, rx, shutdown.clone()));
        tokio::spawn(read_loop(read, Arc::downgrade(&inner), shutdown));

        debug!(%addr, "rpc client connected");
        Ok(Self { inner })
    }

    pub fn addr(&self) -> &str {
        &self.inner.addr
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Close the connection. Idempotent; in-flight calls fail with `Unavailable`.
    pub fn close(&self) {
        if !self.inner.shutdown.is_cancelled() {
            debug!(addr = %self.inner.addr, "closing rpc client");
        }
        self.inner.shutdown.cancel();
        self.inner.pending().clear();
    }

    /// Invoke `method` and decode its result.
    ///
    /// The remaining time of `ctx` travels with the request so the server
    /// stops working once the caller has given up.
    pub async fn call<P, R>(&self, ctx: &CallContext, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if self.is_closed() {
            return Err(ServiceError::Unavailable(format!(
                "connection to {} is closed",
                self.inner.addr
            )));
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let params = serde_json::to_value(params)
            .map_err(|e| ServiceError::Internal(format!("failed to encode {} params: {}", method, e)))?;
        let deadline_ms = ctx
            .remaining()
            .map(|left| u64::try_from(left.as_millis()).unwrap_or(u64::MAX));
        let request = Request {
            id,
            method: method.to_string(),
            deadline_ms,
            params,
        };
        let line = serde_json::to_string(&request)
            .map_err(|e| ServiceError::Internal(format!("failed to encode {} request: {}", method, e)))?;

        let (_slot, rx) = self.inner.register(id)?;

        let exchange = async {
            self.inner
                .outbound
                .send(line)
                .await
                .map_err(|_| self.inner.connection_lost())?;
            rx.await.map_err(|_| self.inner.connection_lost())
        };
        let response = ctx.run(exchange).await??;

        let value = response.into_result()?;
        serde_json::from_value(value)
            .map_err(|e| ServiceError::Internal(format!("malformed {} response: {}", method, e)))
    }
}

async fn write_loop(write: OwnedWriteHalf, mut rx: mpsc::Receiver<String>, shutdown: CancellationToken) {
    let mut sink = FramedWrite::new(write, LinesCodec::new());
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = rx.recv() => line,
        };
        let Some(line) = line else { break };
        if let Err(e) = sink.send(line).await {
            warn!(error = %e, "failed to write request");
            shutdown.cancel();
            break;
        }
    }
}

async fn read_loop(read: OwnedReadHalf, inner: Weak<Inner>, shutdown: CancellationToken) {
    let mut frames = FramedRead::new(read, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = frames.next() => frame,
        };
        let line = match frame {
            None => break,
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!(error = %e, "failed to read response");
                break;
            }
        };

        let response: Response = match serde_json::from_str(&line) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "ignoring malformed response frame");
                continue;
            }
        };
        let Some(inner) = inner.upgrade() else { break };
        let waiter = inner.pending().remove(&response.id);
        match waiter {
            Some(waiter) => {
                // The caller may have given up in the meantime
                let _ = waiter.send(response);
            }
            None => debug!(id = response.id, "response for abandoned call"),
        }
    }

    shutdown.cancel();
    if let Some(inner) = inner.upgrade() {
        inner.pending().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use shared::Status;

    #[tokio::test]
    async fn test_connect_refused_is_unavailable() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = RpcClient::connect(&addr).await.unwrap_err();
        assert_eq!(err.status(), Status::Unavailable);
        assert!(err.to_string().contains(&addr));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_fails_calls() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let client = RpcClient::connect(&addr).await.unwrap();

        assert_eq!(client.addr(), addr);
        client.close();
        client.close();
        assert!(client.is_closed());

        let err = client
            .call::<_, Value>(&CallContext::background(), "echo", &Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Status::Unavailable);
    }

    #[tokio::test]
    async fn test_peer_hangup_fails_pending_call() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(stream);
        });

        let client = RpcClient::connect(&addr).await.unwrap();
        let err = client
            .call::<_, Value>(&CallContext::background(), "echo", &Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Status::Unavailable);
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_cancelled_context_stops_waiting() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        // Accept and hold the connection without ever answering
        let holder = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let client = RpcClient::connect(&addr).await.unwrap();
        let ctx = CallContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = client.call::<_, Value>(&ctx, "echo", &Value::Null).await.unwrap_err();
        assert_eq!(err, ServiceError::Cancelled);
        assert!(client.inner.pending().is_empty());

        client.close();
        holder.abort();
    }

    #[tokio::test]
    async fn test_register_after_shutdown_leaves_no_slot() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let client = RpcClient::connect(&addr).await.unwrap();

        // Reader has exited and cleared the table; the slot must not linger
        client.inner.shutdown.cancel();
        client.inner.pending().clear();

        let err = client.inner.register(7).map(|_| ()).unwrap_err();
        assert_eq!(err.status(), Status::Unavailable);
        assert!(client.inner.pending().is_empty());
    }
}
