use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use tracing::{debug, trace};

use crate::error::CoreError;

use super::{classify_response, Fetcher};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Plain unauthenticated GET client over HTTP(S).
///
/// Holds no per-call state besides the optional request throttle, so one
/// instance can serve concurrent operations.
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: Option<DirectRateLimiter>,
}

impl HttpFetcher {
    /// If `requests_per_second` is set, every outbound request waits for a
    /// token first, keeping the client under the upstream's abuse threshold.
    pub fn new(
        requests_per_second: Option<u32>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .user_agent(concat!("satscan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self { client, limiter })
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CoreError> {
        self.wait_for_rate_limit().await;
        debug!(%url, "fetch");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        let body = response.text().await?;
        debug!(%url, %status, body_len = body.len(), "fetch response");
        trace!(%url, body = %body, "fetch response body");

        let classified = classify_response(url, status.as_u16(), body);
        if let Err(CoreError::RateLimited { .. }) = &classified {
            debug!(%url, "rate limit sentinel received");
        }
        classified
    }
}
