//! Upstream schema variants and the response normalizer.
//!
//! The client has run against two providers with incompatible JSON shapes
//! and URL layouts. [`SchemaVariant`] is chosen at configuration time and
//! owns everything that differs between them: endpoint paths, the pagination
//! cursor, and how a body decodes into canonical records.

mod enveloped;
mod flat;
mod normalize;

pub use normalize::epoch_seconds_to_timestamp;

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{TransactionInfo, TransactionPage, WalletInfo};

/// Which upstream JSON shape to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// `status`/`msg`/`err_code`/`data` envelopes, 1-based page numbers.
    #[default]
    Enveloped,
    /// Bare records, `txs` listings paged by item offset.
    Flat,
}

impl SchemaVariant {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Enveloped => "https://chain.api.btc.com/v3",
            Self::Flat => "https://blockchain.info",
        }
    }

    // ==========================================================================
    // Endpoints
    // ==========================================================================

    /// Caller-supplied parts are percent-encoded as single path segments or
    /// query values, so they can never change the request target.
    pub fn wallet_url(self, base: &str, address: &str) -> Result<String, CoreError> {
        match self {
            Self::Enveloped => build_url(base, &["address", address], None),
            Self::Flat => build_url(base, &["rawaddr", address], None),
        }
    }

    /// The enveloped upstream has no separate balance endpoint; its wallet
    /// record already carries the balance.
    pub fn balance_url(self, base: &str, address: &str) -> Result<String, CoreError> {
        match self {
            Self::Enveloped => self.wallet_url(base, address),
            Self::Flat => build_url(base, &["balance"], Some(("active", address))),
        }
    }

    pub fn transaction_url(self, base: &str, hash: &str) -> Result<String, CoreError> {
        build_url(base, &["tx", hash], None)
    }

    pub fn page_url(self, base: &str, address: &str, cursor: u64) -> Result<String, CoreError> {
        let cursor = cursor.to_string();
        match self {
            Self::Enveloped => {
                build_url(base, &["address", address, "tx"], Some(("page", &cursor)))
            }
            Self::Flat => build_url(base, &["rawaddr", address], Some(("offset", &cursor))),
        }
    }

    // ==========================================================================
    // Pagination Cursor
    // ==========================================================================

    /// Page numbers start at 1; offsets start at 0.
    pub fn first_cursor(self) -> u64 {
        match self {
            Self::Enveloped => 1,
            Self::Flat => 0,
        }
    }

    pub fn next_cursor(self, cursor: u64, page_len: usize) -> u64 {
        match self {
            Self::Enveloped => cursor + 1,
            Self::Flat => cursor + page_len as u64,
        }
    }

    // ==========================================================================
    // Normalizer
    // ==========================================================================

    pub fn parse_wallet(self, body: &str, address: &str) -> Result<WalletInfo, CoreError> {
        match self {
            Self::Enveloped => enveloped::parse_wallet(body, address),
            Self::Flat => flat::parse_wallet(body, address),
        }
    }

    pub fn parse_balance(self, body: &str, address: &str) -> Result<WalletInfo, CoreError> {
        match self {
            Self::Enveloped => enveloped::parse_wallet(body, address),
            Self::Flat => flat::parse_balance(body, address),
        }
    }

    pub fn parse_transaction(self, body: &str) -> Result<TransactionInfo, CoreError> {
        match self {
            Self::Enveloped => enveloped::parse_transaction(body),
            Self::Flat => flat::parse_transaction(body),
        }
    }

    pub fn parse_transaction_page(self, body: &str) -> Result<TransactionPage, CoreError> {
        match self {
            Self::Enveloped => enveloped::parse_transaction_page(body),
            Self::Flat => flat::parse_transaction_page(body),
        }
    }
}

fn build_url(
    base: &str,
    segments: &[&str],
    query: Option<(&str, &str)>,
) -> Result<String, CoreError> {
    let mut url = Url::parse(base)
        .map_err(|err| CoreError::Config(format!("invalid base url `{base}`: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| CoreError::Config(format!("base url `{base}` cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    if let Some((key, value)) = query {
        url.query_pairs_mut().append_pair(key, value);
    }
    Ok(url.into())
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enveloped => write!(f, "enveloped"),
            Self::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enveloped" => Ok(Self::Enveloped),
            "flat" => Ok(Self::Flat),
            other => Err(format!(
                "unknown schema variant `{other}`; expected `enveloped` or `flat`"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::BASE_URL;

    #[test]
    fn enveloped_urls() {
        let v = SchemaVariant::Enveloped;
        let url = |r: Result<String, CoreError>| r.expect("url must build");
        assert_eq!(url(v.wallet_url(BASE_URL, "1abc")), "https://api.test/address/1abc");
        assert_eq!(url(v.balance_url(BASE_URL, "1abc")), "https://api.test/address/1abc");
        assert_eq!(url(v.transaction_url(BASE_URL, "ff")), "https://api.test/tx/ff");
        assert_eq!(
            url(v.page_url(BASE_URL, "1abc", 3)),
            "https://api.test/address/1abc/tx?page=3"
        );
        assert_eq!(
            url(v.page_url("https://chain.api.btc.com/v3", "1abc", 1)),
            "https://chain.api.btc.com/v3/address/1abc/tx?page=1"
        );
    }

    #[test]
    fn flat_urls() {
        let v = SchemaVariant::Flat;
        let url = |r: Result<String, CoreError>| r.expect("url must build");
        assert_eq!(url(v.wallet_url(BASE_URL, "1abc")), "https://api.test/rawaddr/1abc");
        assert_eq!(
            url(v.balance_url(BASE_URL, "1abc")),
            "https://api.test/balance?active=1abc"
        );
        assert_eq!(url(v.transaction_url(BASE_URL, "ff")), "https://api.test/tx/ff");
        assert_eq!(
            url(v.page_url(BASE_URL, "1abc", 100)),
            "https://api.test/rawaddr/1abc?offset=100"
        );
    }

    #[test]
    fn hostile_input_stays_inside_one_segment_or_value() {
        let wallet = SchemaVariant::Enveloped
            .wallet_url(BASE_URL, "1abc/../tx?page=9#frag")
            .expect("url must build");
        let parsed = Url::parse(&wallet).expect("result must parse");
        let segments: Vec<_> = parsed.path_segments().expect("has path").collect();
        assert_eq!(segments.len(), 2, "got {wallet}");
        assert_eq!(segments[0], "address");
        assert!(parsed.query().is_none(), "got {wallet}");
        assert!(parsed.fragment().is_none(), "got {wallet}");

        let tx = SchemaVariant::Flat
            .transaction_url(BASE_URL, "ff?x=1")
            .expect("url must build");
        assert_eq!(tx, "https://api.test/tx/ff%3Fx=1");

        let balance = SchemaVariant::Flat
            .balance_url(BASE_URL, "1abc&active=1evil")
            .expect("url must build");
        let parsed = Url::parse(&balance).expect("result must parse");
        let pairs: Vec<_> = parsed.query_pairs().collect();
        assert_eq!(pairs.len(), 1, "got {balance}");
        assert_eq!(pairs[0].0, "active");
        assert_eq!(pairs[0].1, "1abc&active=1evil");
    }

    #[test]
    fn unusable_base_is_config_error() {
        let err = SchemaVariant::Flat
            .wallet_url("not a url", "1abc")
            .expect_err("must fail");
        assert!(matches!(err, CoreError::Config(_)));
        let err = SchemaVariant::Flat
            .wallet_url("mailto:someone@example.com", "1abc")
            .expect_err("must fail");
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn cursors_advance_per_variant() {
        let enveloped = SchemaVariant::Enveloped;
        assert_eq!(enveloped.first_cursor(), 1);
        assert_eq!(enveloped.next_cursor(1, 50), 2);
        assert_eq!(enveloped.next_cursor(2, 3), 3, "short pages still advance by one");

        let flat = SchemaVariant::Flat;
        assert_eq!(flat.first_cursor(), 0);
        assert_eq!(flat.next_cursor(0, 50), 50);
        assert_eq!(flat.next_cursor(50, 7), 57);
    }

    #[test]
    fn parses_from_str_and_displays() {
        assert_eq!("flat".parse::<SchemaVariant>(), Ok(SchemaVariant::Flat));
        assert_eq!("Enveloped".parse::<SchemaVariant>(), Ok(SchemaVariant::Enveloped));
        assert!("xml".parse::<SchemaVariant>().is_err());
        assert_eq!(SchemaVariant::Flat.to_string(), "flat");
        assert_eq!(SchemaVariant::default(), SchemaVariant::Enveloped);
    }
}
