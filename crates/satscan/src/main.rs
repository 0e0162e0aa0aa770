mod cli;

use std::pin::pin;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use satscan_core::{BlockchainClient, ClientConfig, CoreError, RetryPolicy, RetryingClient};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Cli::parse();

    // stdout carries the JSON output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let client = build_client(&args)?;
    tracing::debug!(
        schema = %client.client().schema(),
        api_url = client.client().base_url(),
        max_attempts = client.policy().max_attempts(),
        "client ready"
    );

    let mut stdout = tokio::io::stdout();
    match &args.command {
        Command::Wallet { address } => {
            let wallet = client.get_wallet(address).await.map_err(|err| {
                eyre!(describe_failure(&format!("look up wallet `{address}`"), &err))
            })?;
            tracing::info!(%wallet, "wallet loaded");
            write_json_line(&mut stdout, &wallet).await?;
        }
        Command::Balance { address } => {
            let wallet = client.get_wallet_balance(address).await.map_err(|err| {
                eyre!(describe_failure(&format!("look up balance of `{address}`"), &err))
            })?;
            tracing::info!(%wallet, "balance loaded");
            write_json_line(&mut stdout, &wallet).await?;
        }
        Command::Tx { hash } => {
            let tx = client.get_transaction(hash).await.map_err(|err| {
                eyre!(describe_failure(&format!("look up transaction `{hash}`"), &err))
            })?;
            tracing::info!(%tx, "transaction loaded");
            write_json_line(&mut stdout, &tx).await?;
        }
        Command::Txs { address, limit } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received; stopping before the next page");
                    on_interrupt.cancel();
                }
            });
            stream_transactions(&client, address, *limit, cancel, &mut stdout).await?;
        }
    }

    stdout.flush().await.context("flush stdout")?;
    Ok(())
}

fn build_client(args: &Cli) -> eyre::Result<RetryingClient> {
    let mut config = ClientConfig::new(args.schema)
        .with_requests_per_second(args.requests_per_second)
        .with_request_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(api_url) = &args.api_url {
        config = config.with_base_url(api_url.clone());
    }

    let client = BlockchainClient::new(&config).context("build upstream client")?;
    let policy = RetryPolicy::new(
        args.max_attempts,
        Duration::from_millis(args.retry_interval_ms),
    )
    .context("invalid retry settings")?;
    Ok(RetryingClient::new(client, policy))
}

/// Write each transaction of `address` as one JSON line, until the listing
/// ends, `limit` is reached, or `cancel` fires.
async fn stream_transactions<W>(
    client: &RetryingClient,
    address: &str,
    limit: Option<usize>,
    cancel: CancellationToken,
    out: &mut W,
) -> eyre::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut listing = pin!(client.list_transactions_for_wallet(address, cancel));
    let mut written = 0usize;

    loop {
        if limit.is_some_and(|max| written >= max) {
            tracing::info!(written, "limit reached");
            break;
        }
        let Some(item) = listing.next().await else {
            tracing::info!(written, "listing complete");
            break;
        };
        match item {
            Ok(tx) => {
                tracing::debug!(%tx, "transaction");
                write_json_line(out, &tx).await?;
                written += 1;
            }
            Err(CoreError::Cancelled) => {
                out.flush().await.context("flush stdout")?;
                return Err(eyre!(
                    "listing of `{address}` interrupted after {written} transactions"
                ));
            }
            Err(err) => {
                out.flush().await.context("flush stdout")?;
                return Err(eyre!(describe_failure(
                    &format!("list transactions of `{address}` (after {written} written)"),
                    &err
                )));
            }
        }
    }

    Ok(written)
}

async fn write_json_line<W, T>(out: &mut W, value: &T) -> eyre::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value).context("serialize record")?;
    line.push(b'\n');
    out.write_all(&line).await.context("write to stdout")?;
    Ok(())
}

fn describe_failure(action: &str, err: &CoreError) -> String {
    let mut lines = vec![format!("could not {action}"), format!("error: {err}")];
    if let Some(hint) = failure_hint(err) {
        lines.push(format!("hint: {hint}"));
    }
    lines.join("\n")
}

fn failure_hint(err: &CoreError) -> Option<&'static str> {
    match err {
        CoreError::RateLimited { .. } => Some(
            "the upstream is rate limiting; raise --max-attempts or --retry-interval-ms, \
             or set --requests-per-second",
        ),
        CoreError::UpstreamStatus { status: 404, .. } => {
            Some("endpoint not found; verify --api-url matches --schema")
        }
        CoreError::Decode(_) => {
            Some("response did not match the expected shape; verify --schema")
        }
        CoreError::InvalidAddress { .. } => {
            Some("addresses must be Base58Check encoded (legacy P2PKH or P2SH)")
        }
        CoreError::Transport(_) => {
            Some("request could not be completed; verify --api-url and network access")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use satscan_core::fetch::Fetcher;

    use super::*;

    const ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

    /// Serves listing pages of one transaction each from a fixed table.
    struct PagedFetcher {
        pages: usize,
    }

    #[async_trait::async_trait]
    impl Fetcher for PagedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CoreError> {
            let page: usize = url
                .rsplit_once("page=")
                .and_then(|(_, n)| n.parse().ok())
                .ok_or_else(|| CoreError::UpstreamStatus {
                    url: url.to_owned(),
                    status: 404,
                })?;
            let list = if page <= self.pages {
                serde_json::json!([{ "hash": format!("tx{page}"), "block_time": page }])
            } else {
                serde_json::json!([])
            };
            Ok(serde_json::json!({
                "status": "success",
                "data": { "list": list }
            })
            .to_string())
        }
    }

    fn client(pages: usize) -> RetryingClient {
        let client = BlockchainClient::with_fetcher(
            Arc::new(PagedFetcher { pages }),
            satscan_core::SchemaVariant::Enveloped,
            "https://api.test",
        )
        .expect("client must build");
        RetryingClient::new(client, RetryPolicy::none())
    }

    #[tokio::test]
    async fn streams_ndjson_until_empty_page() {
        let mut out = Vec::new();
        let written =
            stream_transactions(&client(3), ADDRESS, None, CancellationToken::new(), &mut out)
                .await
                .expect("listing must succeed");
        assert_eq!(written, 3);

        let text = String::from_utf8(out).expect("utf-8 output");
        let hashes: Vec<String> = text
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).expect("json line");
                value["hash"].as_str().expect("hash field").to_owned()
            })
            .collect();
        assert_eq!(hashes, vec!["tx1", "tx2", "tx3"]);
    }

    #[tokio::test]
    async fn limit_stops_early() {
        let mut out = Vec::new();
        let written =
            stream_transactions(&client(10), ADDRESS, Some(2), CancellationToken::new(), &mut out)
                .await
                .expect("listing must succeed");
        assert_eq!(written, 2);
        assert_eq!(String::from_utf8(out).expect("utf-8").lines().count(), 2);
    }

    #[tokio::test]
    async fn cancelled_listing_is_an_error() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let err = stream_transactions(&client(3), ADDRESS, None, cancel, &mut out)
            .await
            .expect_err("cancelled listing must fail");
        assert!(err.to_string().contains("interrupted after 0"));
        assert!(out.is_empty());
    }

    #[test]
    fn hints_cover_common_failures() {
        let limited = CoreError::RateLimited { url: "u".into() };
        assert!(describe_failure("look up wallet", &limited).contains("--max-attempts"));

        let not_found = CoreError::UpstreamStatus {
            url: "u".into(),
            status: 404,
        };
        assert!(failure_hint(&not_found).is_some());

        let server = CoreError::UpstreamStatus {
            url: "u".into(),
            status: 503,
        };
        assert!(failure_hint(&server).is_none());
        assert!(!describe_failure("x", &server).contains("hint"));
    }
}
