use std::time::Duration;

use crate::schema::SchemaVariant;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for building a [`BlockchainClient`](crate::client::BlockchainClient)
/// backed by [`HttpFetcher`](crate::fetch::HttpFetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `https://chain.api.btc.com/v3`. Validated on build.
    pub base_url: String,
    pub schema: SchemaVariant,
    /// Client-side throttle for outbound requests. `None` disables it.
    pub requests_per_second: Option<u32>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Defaults for `schema`, pointed at that variant's public endpoint.
    pub fn new(schema: SchemaVariant) -> Self {
        Self {
            base_url: schema.default_base_url().to_owned(),
            schema,
            requests_per_second: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_requests_per_second(mut self, requests_per_second: Option<u32>) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(SchemaVariant::default())
    }
}
