//! Per-operation deadline and cancellation.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ConnectorError, ConnectorResult};

/// Caller-supplied bounds for one top-level operation.
///
/// Cloning shares the cancellation token.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl OperationContext {
    /// Context with no deadline and a fresh token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use an existing token, e.g. a child of a service-wide shutdown token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Drive `fut` to completion unless the context fires first.
    pub async fn run<F, T>(&self, fut: F) -> ConnectorResult<T>
    where
        F: Future<Output = ConnectorResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ConnectorError::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ConnectorError::Cancelled),
            () = wait_for(self.deadline) => Err(ConnectorError::DeadlineExceeded),
            result = fut => result,
        }
    }

    /// Sleep for `delay`, returning early with an error if the context fires.
    pub async fn sleep(&self, delay: Duration) -> ConnectorResult<()> {
        self.run(async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
