//! Flat schema: the top-level object is the record itself, listings carry a
//! `txs` array, and balance lookups return a mapping keyed by address.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::{JsonObject, TransactionInfo, TransactionPage, WalletInfo};

use super::normalize::{finish_transaction, finish_wallet, parse_epoch, RawTransaction};

#[derive(Deserialize)]
struct RawAddress {
    #[serde(default)]
    hash160: Option<String>,
    #[serde(default)]
    address: String,
    #[serde(default)]
    n_tx: u64,
    #[serde(default)]
    n_unredeemed: u64,
    #[serde(default)]
    total_received: u64,
    #[serde(default)]
    total_sent: u64,
    #[serde(default)]
    final_balance: u64,
}

#[derive(Deserialize)]
struct BalanceEntry {
    #[serde(default)]
    final_balance: u64,
    #[serde(default)]
    n_tx: u64,
    #[serde(default)]
    total_received: u64,
}

#[derive(Deserialize)]
struct RawTx {
    hash: String,
    #[serde(default)]
    fee: u64,
    #[serde(default)]
    relayed_by: Option<String>,
    #[serde(default)]
    time: Option<serde_json::Value>,
    #[serde(default)]
    vin_sz: Option<u64>,
    #[serde(default)]
    vout_sz: Option<u64>,
    #[serde(default)]
    result: i64,
    #[serde(default)]
    inputs: Vec<JsonObject>,
    #[serde(default)]
    out: Vec<JsonObject>,
}

#[derive(Deserialize)]
struct TxList {
    #[serde(default)]
    txs: Vec<RawTx>,
}

pub(super) fn parse_wallet(body: &str, address: &str) -> Result<WalletInfo, CoreError> {
    let raw: RawAddress = serde_json::from_str(body)?;
    let mut wallet = WalletInfo::empty(if raw.address.is_empty() {
        address.to_owned()
    } else {
        raw.address
    });
    wallet.number_transactions = raw.n_tx;
    wallet.number_unredeemed = raw.n_unredeemed;
    wallet.total_received = raw.total_received;
    wallet.total_sent = raw.total_sent;
    wallet.final_balance = raw.final_balance;
    finish_wallet(wallet, raw.hash160.as_deref())
}

/// Look `address` up in the balance mapping. A missing key is a wallet the
/// upstream has never seen, reported as a zero-valued record.
pub(super) fn parse_balance(body: &str, address: &str) -> Result<WalletInfo, CoreError> {
    let mut balances: HashMap<String, BalanceEntry> = serde_json::from_str(body)?;
    let mut wallet = WalletInfo::empty(address);
    if let Some(entry) = balances.remove(address) {
        wallet.number_transactions = entry.n_tx;
        wallet.total_received = entry.total_received;
        wallet.final_balance = entry.final_balance;
        wallet.total_sent = entry.total_received.saturating_sub(entry.final_balance);
    }
    finish_wallet(wallet, None)
}

pub(super) fn parse_transaction(body: &str) -> Result<TransactionInfo, CoreError> {
    let raw: RawTx = serde_json::from_str(body)?;
    normalize_tx(raw)
}

pub(super) fn parse_transaction_page(body: &str) -> Result<TransactionPage, CoreError> {
    let list: TxList = serde_json::from_str(body)?;
    let items = list
        .txs
        .into_iter()
        .map(normalize_tx)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TransactionPage { items })
}

fn normalize_tx(raw: RawTx) -> Result<TransactionInfo, CoreError> {
    let raw_time = parse_epoch(raw.time.as_ref(), "time")?;
    let inputs_value = sum_values(&raw.inputs, |input| {
        input.get("prev_out").and_then(|p| p.get("value"))
    });
    let outputs_value = sum_values(&raw.out, |output| output.get("value"));

    finish_transaction(RawTransaction {
        hash: raw.hash,
        fee: raw.fee,
        relayed_by: raw.relayed_by,
        raw_time,
        inputs_count: raw.vin_sz.unwrap_or(raw.inputs.len() as u64),
        inputs_value,
        outputs_count: raw.vout_sz.unwrap_or(raw.out.len() as u64),
        outputs_value,
        balance: raw.result,
        inputs: raw.inputs,
        outputs: raw.out,
    })
}

/// Sum the satoshi values found by `value_of`; entries without one (coinbase
/// inputs) count as zero.
fn sum_values<'a, F>(entries: &'a [JsonObject], value_of: F) -> u64
where
    F: Fn(&'a JsonObject) -> Option<&'a serde_json::Value>,
{
    entries
        .iter()
        .filter_map(|entry| value_of(entry).and_then(serde_json::Value::as_u64))
        .fold(0u64, u64::saturating_add)
}
