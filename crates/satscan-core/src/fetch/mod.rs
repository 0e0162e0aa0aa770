//! HTTP fetch layer.
//!
//! Defines the [`Fetcher`] trait and provides a `reqwest` implementation
//! ([`HttpFetcher`]) plus a test mock (`mock::MockFetcher`).

mod connection;
mod http;
#[cfg(test)]
pub mod mock;

pub use connection::parse_base_url;
pub use http::HttpFetcher;

use async_trait::async_trait;

use crate::error::CoreError;

/// Body the upstream sends, with HTTP 200, instead of a 429 when it decides a
/// client is hammering it.
pub const RATE_LIMIT_SENTINEL: &str = "Don't abuse the API. Please contact support@btcm.group\n";

/// One GET round-trip against the upstream.
///
/// Implementations return the raw body of a successful response and map
/// transport failures, non-2xx statuses and the rate-limit sentinel onto
/// [`CoreError`]. They never decode JSON.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CoreError>;
}

/// Classify a completed HTTP exchange. The sentinel check is an exact match
/// and happens before anyone tries to decode the body.
pub fn classify_response(url: &str, status: u16, body: String) -> Result<String, CoreError> {
    if !(200..300).contains(&status) {
        return Err(CoreError::UpstreamStatus {
            url: url.to_owned(),
            status,
        });
    }
    if body == RATE_LIMIT_SENTINEL {
        return Err(CoreError::RateLimited {
            url: url.to_owned(),
        });
    }
    Ok(body)
}
