//! Post-decode normalization pass shared by every schema variant.
//!
//! Variants decode the upstream JSON into [`RawTransaction`] / [`WalletInfo`]
//! with plain serde field mapping; the derived fields (`time`, `hash160`) are
//! filled here, after decoding, so the transformation can be tested on its own.

use time::OffsetDateTime;

use crate::address::Hash160;
use crate::error::CoreError;
use crate::types::{JsonObject, TransactionInfo, WalletInfo};

/// Interpret `secs` as seconds since the Unix epoch (UTC).
pub fn epoch_seconds_to_timestamp(secs: i64) -> Result<OffsetDateTime, CoreError> {
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| CoreError::Decode(format!("epoch seconds {secs} out of range: {e}")))
}

/// A transaction as decoded from the upstream, before derived fields exist.
#[derive(Debug)]
pub(super) struct RawTransaction {
    pub(super) hash: String,
    pub(super) fee: u64,
    pub(super) relayed_by: Option<String>,
    pub(super) raw_time: i64,
    pub(super) inputs_count: u64,
    pub(super) inputs_value: u64,
    pub(super) outputs_count: u64,
    pub(super) outputs_value: u64,
    pub(super) balance: i64,
    pub(super) inputs: Vec<JsonObject>,
    pub(super) outputs: Vec<JsonObject>,
}

pub(super) fn finish_transaction(raw: RawTransaction) -> Result<TransactionInfo, CoreError> {
    let time = epoch_seconds_to_timestamp(raw.raw_time)?;
    Ok(TransactionInfo {
        hash: raw.hash,
        fee: raw.fee,
        relayed_by: raw.relayed_by.filter(|r| !r.is_empty()),
        time,
        raw_time: raw.raw_time,
        inputs_count: raw.inputs_count,
        inputs_value: raw.inputs_value,
        outputs_count: raw.outputs_count,
        outputs_value: raw.outputs_value,
        balance: raw.balance,
        inputs: raw.inputs,
        outputs: raw.outputs,
    })
}

/// Attach `hash160` to a decoded wallet: the upstream's own value when it
/// supplied one, otherwise a single Base58Check decode of the address.
pub(super) fn finish_wallet(
    mut wallet: WalletInfo,
    upstream_hash160: Option<&str>,
) -> Result<WalletInfo, CoreError> {
    match upstream_hash160.filter(|h| !h.is_empty()) {
        Some(hex) => wallet.set_upstream_hash160(Hash160::from_hex(hex)?),
        None => wallet.derive_hash160()?,
    }
    Ok(wallet)
}

/// Read an epoch-seconds field that the upstream encodes either as a JSON
/// integer or as a decimal string.
pub(super) fn parse_epoch(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<i64, CoreError> {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| CoreError::Decode(format!("{field} is not an integer: {n}"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| CoreError::Decode(format!("invalid {field} `{s}`: {e}"))),
        None | Some(serde_json::Value::Null) => {
            Err(CoreError::Decode(format!("missing {field}")))
        }
        Some(other) => Err(CoreError::Decode(format!(
            "expected epoch seconds in {field}, got: {other}"
        ))),
    }
}
