use clap::{Parser, Subcommand};

use satscan_core::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL};
use satscan_core::SchemaVariant;

/// satscan: query Bitcoin wallets and transactions from a public block
/// explorer API, printed as normalized JSON.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Upstream API root. Defaults to the public endpoint of `--schema`.
    #[arg(long, global = true, env = "SATSCAN_API_URL")]
    pub api_url: Option<String>,

    /// Upstream response shape: `enveloped` or `flat`.
    #[arg(long, global = true, default_value = "enveloped", env = "SATSCAN_SCHEMA")]
    pub schema: SchemaVariant,

    /// Client-side request throttle. Unthrottled if omitted.
    #[arg(long, global = true, env = "SATSCAN_REQUESTS_PER_SECOND")]
    pub requests_per_second: Option<u32>,

    /// Attempts per request when the upstream rate-limits us (first try included).
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        env = "SATSCAN_MAX_ATTEMPTS"
    )]
    pub max_attempts: u32,

    /// Pause between rate-limited attempts, in milliseconds.
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_RETRY_INTERVAL.as_millis() as u64,
        env = "SATSCAN_RETRY_INTERVAL_MS"
    )]
    pub retry_interval_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value = "30", env = "SATSCAN_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Full wallet record for an address.
    Wallet { address: String },

    /// Balance-only lookup for an address.
    Balance { address: String },

    /// A single transaction by hash.
    Tx { hash: String },

    /// Stream every transaction of a wallet as newline-delimited JSON.
    Txs {
        address: String,

        /// Stop after this many transactions.
        #[arg(long)]
        limit: Option<usize>,
    },
}
