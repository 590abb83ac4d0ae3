//! Cancellation and deadline carrier for a request.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Carries cancellation and deadlines into the transport stage.
///
/// The default value never cancels and has no deadline. Clones share the
/// same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Cancel when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Fail once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fail if a single execution takes longer than `timeout`.
    ///
    /// Unlike a deadline this is measured from the start of each call, so a
    /// context stored on a reusable base request stays valid.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn effective_deadline(&self) -> Option<Instant> {
        let relative = self.timeout.map(|t| Instant::now() + t);
        match (self.deadline, relative) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let deadline = self.effective_deadline();
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            res = fut => res,
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = expired => Err(Error::DeadlineExceeded),
        }
    }
}
