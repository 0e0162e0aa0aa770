pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod retry;
pub mod schema;
pub mod types;

#[cfg(test)]
mod test_util;

pub use address::{derive_hash160, DecodedAddress, Hash160};
pub use client::BlockchainClient;
pub use config::ClientConfig;
pub use error::CoreError;
pub use fetch::{Fetcher, HttpFetcher};
pub use metrics::{InMemoryMetrics, MetricsSink, NoopMetrics};
pub use retry::{RetryPolicy, RetryingClient};
pub use schema::{epoch_seconds_to_timestamp, SchemaVariant};
pub use types::{TransactionInfo, TransactionPage, WalletInfo};
