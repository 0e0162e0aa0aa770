/// Errors surfaced by the data-access layer.
///
/// The client performs no local recovery: every variant reaches the caller
/// untouched, and only [`CoreError::RateLimited`] is retried by the default
/// [`RetryPolicy`](crate::retry::RetryPolicy).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("rate limited by upstream at {url}")]
    RateLimited { url: String },

    #[error("upstream reported failure (code {code}): {message}")]
    UpstreamLogical { code: i64, message: String },

    #[error("invalid upstream response: {0}")]
    Decode(String),

    #[error("invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// True when the upstream answered with its abuse sentinel.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// True for conditions that may clear up on their own. Broader than
    /// [`Self::is_rate_limit`]; not used by the default retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
