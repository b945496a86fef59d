//! Per-request context.
//!
//! [`RequestContext`] carries cancellation and an optional deadline into every
//! network call and backoff sleep, so an abandoned login attempt stops
//! talking to the upstream promptly. [`AuthFlowContext`] identifies the
//! enclosing login flow when building authorization URLs.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::FetchError;

/// Cancellation and deadline for a single claims resolution.
///
/// Cloning is cheap; clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with no deadline and a fresh cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context bound to an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            deadline: None,
        }
    }

    /// Sets a deadline `timeout` from now. An earlier existing deadline wins.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline. An earlier existing deadline wins.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns `true` if the context was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns `true` if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails if the context is already cancelled or expired.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] or [`FetchError::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if self.is_expired() {
            return Err(FetchError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drives `future` to completion unless the context is cancelled or its
    /// deadline expires first, in which case the future is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] or [`FetchError::DeadlineExceeded`].
    pub async fn run<F>(&self, future: F) -> Result<F::Output, FetchError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(FetchError::Cancelled),
            _ = sleep_until(self.deadline) => Err(FetchError::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Identifies the login flow an authorization URL is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthFlowContext {
    flow_id: Uuid,
}

impl AuthFlowContext {
    /// Creates a context for an existing flow.
    #[must_use]
    pub fn new(flow_id: Uuid) -> Self {
        Self { flow_id }
    }

    /// Creates a context for a new flow with a random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }

    /// Returns the flow ID.
    #[must_use]
    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }
}
