//! CallContext - deadline and cancellation carried by every boundary call

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// Why a context-bound call stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("call cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for ServiceError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => ServiceError::Cancelled,
            Interrupted::DeadlineExceeded => ServiceError::DeadlineExceeded,
        }
    }
}

/// Cancellable, deadline-bearing call context
///
/// Cloning shares the cancellation token. [`CallContext::child`] derives a
/// context that is cancelled with its parent but can be cancelled alone.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

impl CallContext {
    /// A context with no deadline
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// Child context sharing the parent's cancellation and deadline
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    /// Child context whose deadline is the earlier of the parent's and `timeout` from now
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `fut` until it completes or the context is cancelled or expires.
    ///
    /// When the context wins, `fut` is dropped at its current await point.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}
