//! Bounded retry with constant backoff, and a client wrapper that applies it.
//!
//! Retrying is never done by [`BlockchainClient`] itself. A [`RetryPolicy`]
//! decides which errors are worth another attempt; by default that is only
//! the upstream's rate-limit sentinel, so status, logical, decode and
//! invalid-address errors surface on the first failure.

use std::future::Future;
use std::time::Duration;

use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::BlockchainClient;
use crate::error::CoreError;
use crate::types::{TransactionInfo, WalletInfo};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

// ==============================================================================
// Retry Policy
// ==============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
    is_retryable: fn(&CoreError) -> bool,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; it must be at least 1.
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, CoreError> {
        if max_attempts == 0 {
            return Err(CoreError::Config(
                "retry max attempts must be at least 1".to_owned(),
            ));
        }
        Ok(Self {
            max_attempts,
            interval,
            is_retryable: CoreError::is_rate_limit,
        })
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            interval: Duration::ZERO,
            is_retryable: CoreError::is_rate_limit,
        }
    }

    pub fn with_retryable(mut self, is_retryable: fn(&CoreError) -> bool) -> Self {
        self.is_retryable = is_retryable;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_retryable(&self, err: &CoreError) -> bool {
        (self.is_retryable)(err)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or runs
    /// out of attempts. The last error is returned unchanged. Cancelling
    /// `cancel` interrupts the backoff sleep.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && self.is_retryable(&err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        interval_ms = self.interval.as_millis() as u64,
                        error = %err,
                        "retryable upstream error; backing off"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(attempt, "retry backoff cancelled");
                            return Err(CoreError::Cancelled);
                        }
                        _ = tokio::time::sleep(self.interval) => {}
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
            is_retryable: CoreError::is_rate_limit,
        }
    }
}

// ==============================================================================
// Retrying Client
// ==============================================================================

/// [`BlockchainClient`] with a [`RetryPolicy`] wrapped around every upstream
/// request. Listings retry each page fetch on its own, so a rate limit on
/// page N never replays pages 1..N.
pub struct RetryingClient {
    client: BlockchainClient,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(client: BlockchainClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn get_wallet(&self, address: &str) -> Result<WalletInfo, CoreError> {
        self.policy
            .run(&CancellationToken::new(), || self.client.get_wallet(address))
            .await
    }

    pub async fn get_wallet_balance(&self, address: &str) -> Result<WalletInfo, CoreError> {
        self.policy
            .run(&CancellationToken::new(), || {
                self.client.get_wallet_balance(address)
            })
            .await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, CoreError> {
        self.policy
            .run(&CancellationToken::new(), || self.client.get_transaction(hash))
            .await
    }

    pub fn list_transactions_for_wallet<'a>(
        &'a self,
        address: &'a str,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<TransactionInfo, CoreError>> + Send + 'a {
        self.client.paginate(address, cancel, self.policy)
    }
}
