//! Blockchain client: wallet, balance and transaction lookups plus paginated
//! wallet transaction listings, built on a [`Fetcher`] and a [`SchemaVariant`].

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, Stream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::fetch::{parse_base_url, Fetcher, HttpFetcher};
use crate::metrics::{MetricsSink, NoopMetrics};
use crate::retry::RetryPolicy;
use crate::schema::SchemaVariant;
use crate::types::{TransactionInfo, TransactionPage, WalletInfo};

pub const OP_GET_WALLET: &str = "get_wallet";
pub const OP_GET_WALLET_BALANCE: &str = "get_wallet_balance";
pub const OP_GET_TRANSACTION: &str = "get_transaction";
pub const OP_LIST_TRANSACTIONS: &str = "list_transactions";

/// Read-only client for one upstream block explorer.
///
/// Holds no mutable session state between calls, so a single instance can
/// serve concurrent operations on different wallets and transactions. Every
/// error is returned to the caller untouched; retries belong to
/// [`RetryingClient`](crate::retry::RetryingClient).
pub struct BlockchainClient {
    fetcher: Arc<dyn Fetcher>,
    schema: SchemaVariant,
    base_url: String,
    metrics: Arc<dyn MetricsSink>,
}

impl BlockchainClient {
    /// Build a client that talks HTTP via [`HttpFetcher`].
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let fetcher = HttpFetcher::new(
            config.requests_per_second,
            config.connect_timeout,
            config.request_timeout,
        )?;
        Self::with_fetcher(Arc::new(fetcher), config.schema, &config.base_url)
    }

    pub fn with_fetcher(
        fetcher: Arc<dyn Fetcher>,
        schema: SchemaVariant,
        base_url: &str,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            fetcher,
            schema,
            base_url: parse_base_url(base_url)?,
            metrics: Arc::new(NoopMetrics),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn schema(&self) -> SchemaVariant {
        self.schema
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ==========================================================================
    // Single Lookups
    // ==========================================================================

    /// Fetch a wallet by Base58Check address. `hash160` is filled from the
    /// upstream or derived from the address.
    pub async fn get_wallet(&self, address: &str) -> Result<WalletInfo, CoreError> {
        let url = self.schema.wallet_url(&self.base_url, address)?;
        debug!(%url, "get wallet");
        let wallet = self
            .observe(OP_GET_WALLET, async {
                let body = self.fetcher.fetch(&url).await?;
                self.schema.parse_wallet(&body, address)
            })
            .await?;
        self.metrics.record_rows(OP_GET_WALLET, 1);
        Ok(wallet)
    }

    /// Balance-only lookup. Addresses the upstream has never seen come back
    /// as zero-valued records rather than errors.
    pub async fn get_wallet_balance(&self, address: &str) -> Result<WalletInfo, CoreError> {
        let url = self.schema.balance_url(&self.base_url, address)?;
        debug!(%url, "get wallet balance");
        let wallet = self
            .observe(OP_GET_WALLET_BALANCE, async {
                let body = self.fetcher.fetch(&url).await?;
                self.schema.parse_balance(&body, address)
            })
            .await?;
        self.metrics.record_rows(OP_GET_WALLET_BALANCE, 1);
        Ok(wallet)
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, CoreError> {
        let url = self.schema.transaction_url(&self.base_url, hash)?;
        debug!(%url, "get transaction");
        let tx = self
            .observe(OP_GET_TRANSACTION, async {
                let body = self.fetcher.fetch(&url).await?;
                self.schema.parse_transaction(&body)
            })
            .await?;
        self.metrics.record_rows(OP_GET_TRANSACTION, 1);
        Ok(tx)
    }

    /// Fetch a single listing page. `cursor` is a page number or an item
    /// offset depending on the schema variant.
    pub async fn get_transaction_page(
        &self,
        address: &str,
        cursor: u64,
    ) -> Result<TransactionPage, CoreError> {
        let url = self.schema.page_url(&self.base_url, address, cursor)?;
        debug!(%url, cursor, "get transaction page");
        let page = self
            .observe(OP_LIST_TRANSACTIONS, async {
                let body = self.fetcher.fetch(&url).await?;
                self.schema.parse_transaction_page(&body)
            })
            .await?;
        self.metrics
            .record_rows(OP_LIST_TRANSACTIONS, page.len() as u64);
        Ok(page)
    }

    // ==========================================================================
    // Listing
    // ==========================================================================

    /// Every transaction involving `address`, in upstream order.
    ///
    /// Pages are requested strictly in sequence and the stream ends, without
    /// an error, at the first empty page. A short but non-empty page does not
    /// end the listing. `cancel` is checked before each page request; a
    /// cancelled listing ends with [`CoreError::Cancelled`]. Any error ends
    /// the stream after being yielded. Calling this again restarts from the
    /// first page.
    pub fn list_transactions_for_wallet<'a>(
        &'a self,
        address: &'a str,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<TransactionInfo, CoreError>> + Send + 'a {
        self.paginate(address, cancel, RetryPolicy::none())
    }

    pub(crate) fn paginate<'a>(
        &'a self,
        address: &'a str,
        cancel: CancellationToken,
        policy: RetryPolicy,
    ) -> impl Stream<Item = Result<TransactionInfo, CoreError>> + Send + 'a {
        let start = Pager {
            cursor: self.schema.first_cursor(),
            pending: VecDeque::new(),
            exhausted: false,
            pages_fetched: 0,
        };

        stream::try_unfold(start, move |mut pager| {
            let cancel = cancel.clone();
            async move {
                loop {
                    if let Some(tx) = pager.pending.pop_front() {
                        return Ok(Some((tx, pager)));
                    }
                    if pager.exhausted {
                        return Ok(None);
                    }
                    if cancel.is_cancelled() {
                        debug!(address, cursor = pager.cursor, "listing cancelled");
                        return Err(CoreError::Cancelled);
                    }

                    let cursor = pager.cursor;
                    let page = policy
                        .run(&cancel, || self.get_transaction_page(address, cursor))
                        .await?;
                    pager.pages_fetched += 1;

                    if page.is_empty() {
                        debug!(
                            address,
                            cursor,
                            pages = pager.pages_fetched,
                            "empty page; listing complete"
                        );
                        pager.exhausted = true;
                        continue;
                    }

                    pager.cursor = self.schema.next_cursor(cursor, page.len());
                    pager.pending.extend(page.items);
                }
            }
        })
    }

    async fn observe<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T, CoreError>
    where
        Fut: Future<Output = Result<T, CoreError>>,
    {
        self.metrics.record_request(op);
        let started = Instant::now();
        let result = fut.await;
        self.metrics
            .record_latency(op, started.elapsed(), result.is_ok());
        result
    }
}

/// Listing progress carried between polls of the stream.
struct Pager {
    cursor: u64,
    pending: VecDeque<TransactionInfo>,
    exhausted: bool,
    pages_fetched: u64,
}
