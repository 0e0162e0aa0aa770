//! Canonical records produced by the client.
//!
//! These are independent of the upstream JSON shape: every schema variant
//! normalizes into the same [`WalletInfo`] / [`TransactionInfo`]. Fields that
//! are derived during normalization (`hash160`, `time`) and the fields they
//! derive from (`address`, `raw_time`) are only readable from outside the
//! crate, so the pair cannot drift apart.

use std::fmt;

use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::address::{derive_hash160, Hash160};
use crate::error::CoreError;

/// An opaque upstream input/output record, passed through unmodified.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

// ==============================================================================
// Wallet
// ==============================================================================

/// Aggregate state of a single Bitcoin address. Amounts are in satoshis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletInfo {
    address: String,
    hash160: Option<Hash160>,
    pub number_transactions: u64,
    pub number_unredeemed: u64,
    pub total_received: u64,
    pub total_sent: u64,
    pub final_balance: u64,
}

impl WalletInfo {
    /// A zero-valued record for `address`, used when the upstream knows
    /// nothing about it.
    pub fn empty(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            hash160: None,
            number_transactions: 0,
            number_unredeemed: 0,
            total_received: 0,
            total_sent: 0,
            final_balance: 0,
        }
    }

    /// The Base58Check address this record describes. Fixed at construction;
    /// there is no setter.
    ///
    /// ```compile_fail
    /// let mut wallet = satscan_core::WalletInfo::empty("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
    /// wallet.address = "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_owned();
    /// ```
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The 20-byte hash encoded by `address`, excluding the version byte.
    pub fn hash160(&self) -> Option<&Hash160> {
        self.hash160.as_ref()
    }

    /// Fill `hash160` by decoding `address`. The record is left untouched
    /// when decoding fails.
    pub(crate) fn derive_hash160(&mut self) -> Result<(), CoreError> {
        let decoded = derive_hash160(&self.address)?;
        self.hash160 = Some(decoded.into_hash160());
        Ok(())
    }

    pub(crate) fn set_upstream_hash160(&mut self, hash160: Hash160) {
        self.hash160 = Some(hash160);
    }
}

impl fmt::Display for WalletInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash160 = self
            .hash160
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        write!(
            f,
            "WalletInfo{{address={}/{},txns={} total/{} unred,funds={} in/{} out,balance={}}}",
            self.address,
            hash160,
            self.number_transactions,
            self.number_unredeemed,
            self.total_received,
            self.total_sent,
            self.final_balance,
        )
    }
}

// ==============================================================================
// Transaction
// ==============================================================================

/// One blockchain transaction, optionally seen from a queried wallet.
///
/// `balance` is the wallet-relative net effect and is only meaningful when the
/// record came from a wallet listing. `time` always equals
/// `epoch_seconds_to_timestamp(raw_time)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionInfo {
    pub hash: String,
    pub fee: u64,
    pub relayed_by: Option<String>,
    #[serde(rename = "time", serialize_with = "serialize_rfc3339")]
    pub(crate) time: OffsetDateTime,
    #[serde(skip)]
    pub(crate) raw_time: i64,
    pub inputs_count: u64,
    pub inputs_value: u64,
    pub outputs_count: u64,
    pub outputs_value: u64,
    pub balance: i64,
    pub inputs: Vec<JsonObject>,
    pub outputs: Vec<JsonObject>,
}

impl TransactionInfo {
    pub fn time(&self) -> OffsetDateTime {
        self.time
    }

    /// The epoch-seconds value the upstream returned.
    pub fn raw_time(&self) -> i64 {
        self.raw_time
    }
}

impl fmt::Display for TransactionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransactionInfo{{hash={},value={} fee/{} balance,time={}}}",
            self.hash, self.fee, self.balance, self.time,
        )
    }
}

fn serialize_rfc3339<S: Serializer>(
    time: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let formatted = time.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

// ==============================================================================
// Transaction Page
// ==============================================================================

/// One page of a wallet's transaction listing, in upstream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPage {
    pub items: Vec<TransactionInfo>,
}

impl TransactionPage {
    /// An empty page is the only end-of-stream signal the upstream gives.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
