//! Bounded operation scopes
//!
//! A scope is opened when a request handler starts and fixes a deadline for
//! every store call the handler makes. Calls issued after the deadline fail
//! immediately with [`StoreError::Timeout`].

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};

/// Timeout applied to a handler's store calls unless configured otherwise
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Request-lifetime deadline shared by all store calls of one operation
#[derive(Debug, Clone, Copy)]
pub struct OperationScope {
    timeout: Duration,
    deadline: Instant,
}

impl OperationScope {
    /// Open a scope whose deadline is `timeout` from now
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Drive `operation` to completion unless the deadline passes first
    pub async fn run<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.is_expired() {
            return Err(StoreError::Timeout(self.timeout));
        }
        match tokio::time::timeout_at(self.deadline, operation).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

impl Default for OperationScope {
    fn default() -> Self {
        Self::new(DEFAULT_OPERATION_TIMEOUT)
    }
}
