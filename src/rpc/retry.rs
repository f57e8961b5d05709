// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded retries with backoff and per-call timeouts
//!
//! Every RPC call the engine makes goes through [`RetryingRpc`]. Each
//! attempt is bounded by the configured timeout; transient failures are
//! retried after a backoff delay until the attempt budget is spent, and
//! permanent failures stop immediately. Either way the caller receives a
//! [`RetrievalError`] naming the operation and the attempt count.
//!
//! The backoff formula for [`Backoff::Exponential`] is:
//!
//! ```text
//! delay = min(base_delay * 2^attempt, max_delay)
//! ```

use std::future::Future;
use std::time::Duration;

use alloy_primitives::{Address, BlockNumber, Bytes, TxHash};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};

use super::{BlockRef, BlockSummary, ChainRpc, RawLog, TxReceipt};
use crate::config::constants::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use crate::errors::{RetrievalError, RpcError, RpcOperation};
use crate::events::LogFilter;

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    #[default]
    Exponential,
    /// Always wait `base_delay`
    Fixed,
}

/// Retry discipline for RPC calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the initial call included. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Same delay before every retry
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Doubling delay starting at `base_delay`, capped at `max_delay`
    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff: Backoff::Exponential,
        }
    }
}

/// Delay to wait after the failed attempt number `attempt` (zero-based)
pub fn calculate_backoff(attempt: u32, policy: &RetryPolicy) -> Duration {
    match policy.backoff {
        Backoff::Fixed => policy.base_delay,
        Backoff::Exponential => {
            let multiplier = 2u64.saturating_pow(attempt);
            let delay_ms = policy
                .base_delay
                .as_millis()
                .saturating_mul(multiplier as u128);
            let capped_delay_ms = delay_ms.min(policy.max_delay.as_millis()) as u64;
            Duration::from_millis(capped_delay_ms)
        }
    }
}

/// A [`ChainRpc`] with timeouts and retries applied to every call
///
/// Borrows the underlying client, so one client can serve many harvests.
#[derive(Debug)]
pub struct RetryingRpc<'a, R: ?Sized> {
    inner: &'a R,
    policy: &'a RetryPolicy,
    call_timeout: Duration,
}

impl<'a, R: ChainRpc + ?Sized> RetryingRpc<'a, R> {
    pub fn new(inner: &'a R, policy: &'a RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            inner,
            policy,
            call_timeout,
        }
    }

    pub async fn block_number(&self) -> Result<BlockNumber, RetrievalError> {
        self.run(RpcOperation::BlockNumber, || self.inner.block_number())
            .await
    }

    pub async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RetrievalError> {
        self.run(RpcOperation::Logs(Box::new(filter.clone())), || {
            self.inner.logs(filter)
        })
        .await
    }

    pub async fn block(&self, block: BlockRef) -> Result<BlockSummary, RetrievalError> {
        self.run(RpcOperation::Block(block), || self.inner.block(block))
            .await
    }

    pub async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, RetrievalError> {
        self.run(RpcOperation::Receipt(tx_hash), || {
            self.inner.transaction_receipt(tx_hash)
        })
        .await
    }

    pub async fn code_at(&self, address: Address) -> Result<Bytes, RetrievalError> {
        self.run(RpcOperation::Code(address), || self.inner.code_at(address))
            .await
    }

    async fn run<T, F, Fut>(&self, operation: RpcOperation, mut call: F) -> Result<T, RetrievalError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let outcome = match timeout(self.call_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(RpcError::Timeout {
                    timeout: self.call_timeout,
                }),
            };
            attempt += 1;

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(%operation, attempt, "RPC call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_transient() || attempt >= max_attempts {
                error!(
                    %operation,
                    attempts = attempt,
                    error = %error,
                    "RPC call failed"
                );
                return Err(RetrievalError {
                    operation,
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = calculate_backoff(attempt - 1, self.policy);
            warn!(
                %operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient RPC failure, retrying after backoff"
            );
            sleep(delay).await;
        }
    }
}
