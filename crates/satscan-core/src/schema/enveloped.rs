//! Enveloped schema: `{"status", "msg", "err_code", "data"}` wrappers with
//! paginated listings nested under `data.list`.

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::{JsonObject, TransactionInfo, TransactionPage, WalletInfo};

use super::normalize::{finish_transaction, finish_wallet, parse_epoch, RawTransaction};

const STATUS_SUCCESS: &str = "success";

#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    err_code: i64,
    #[serde(default)]
    data: serde_json::Value,
}

impl Envelope {
    /// Check the envelope status before looking at `data`, whose shape is
    /// unspecified on failure.
    fn into_data(self) -> Result<serde_json::Value, CoreError> {
        if self.status != STATUS_SUCCESS {
            let message = if self.msg.is_empty() {
                format!("status `{}`", self.status)
            } else {
                self.msg
            };
            return Err(CoreError::UpstreamLogical {
                code: self.err_code,
                message,
            });
        }
        Ok(self.data)
    }
}

#[derive(Deserialize)]
struct WalletData {
    #[serde(default)]
    address: String,
    #[serde(default)]
    tx_count: u64,
    #[serde(default)]
    unspent_tx_count: u64,
    #[serde(default)]
    received: u64,
    #[serde(default)]
    sent: u64,
    #[serde(default)]
    balance: u64,
}

#[derive(Deserialize)]
struct TxData {
    hash: String,
    #[serde(default)]
    fee: u64,
    #[serde(default)]
    block_time: Option<serde_json::Value>,
    #[serde(default)]
    created_at: Option<serde_json::Value>,
    #[serde(default)]
    inputs_count: u64,
    #[serde(default)]
    inputs_value: u64,
    #[serde(default)]
    outputs_count: u64,
    #[serde(default)]
    outputs_value: u64,
    #[serde(default)]
    balance_diff: i64,
    #[serde(default)]
    inputs: Vec<JsonObject>,
    #[serde(default)]
    outputs: Vec<JsonObject>,
}

#[derive(Deserialize)]
struct PageData {
    #[serde(default)]
    list: Option<Vec<TxData>>,
}

fn open(body: &str) -> Result<serde_json::Value, CoreError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    envelope.into_data()
}

/// A `null` payload means the upstream has never seen the address.
pub(super) fn parse_wallet(body: &str, address: &str) -> Result<WalletInfo, CoreError> {
    let data = open(body)?;
    if data.is_null() {
        return finish_wallet(WalletInfo::empty(address), None);
    }

    let data: WalletData = serde_json::from_value(data)
        .map_err(|e| CoreError::Decode(format!("invalid wallet payload: {e}")))?;
    let mut wallet = WalletInfo::empty(if data.address.is_empty() {
        address.to_owned()
    } else {
        data.address
    });
    wallet.number_transactions = data.tx_count;
    wallet.number_unredeemed = data.unspent_tx_count;
    wallet.total_received = data.received;
    wallet.total_sent = data.sent;
    wallet.final_balance = data.balance;
    finish_wallet(wallet, None)
}

pub(super) fn parse_transaction(body: &str) -> Result<TransactionInfo, CoreError> {
    let data = open(body)?;
    if data.is_null() {
        return Err(CoreError::Decode("transaction payload is null".to_owned()));
    }
    let data: TxData = serde_json::from_value(data)
        .map_err(|e| CoreError::Decode(format!("invalid transaction payload: {e}")))?;
    normalize_tx(data)
}

pub(super) fn parse_transaction_page(body: &str) -> Result<TransactionPage, CoreError> {
    let data = open(body)?;
    if data.is_null() {
        return Ok(TransactionPage::default());
    }
    let data: PageData = serde_json::from_value(data)
        .map_err(|e| CoreError::Decode(format!("invalid transaction page payload: {e}")))?;
    let items = data
        .list
        .unwrap_or_default()
        .into_iter()
        .map(normalize_tx)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TransactionPage { items })
}

fn normalize_tx(data: TxData) -> Result<TransactionInfo, CoreError> {
    let time_field = data
        .block_time
        .as_ref()
        .filter(|v| !v.is_null())
        .or(data.created_at.as_ref());
    let raw_time = parse_epoch(time_field, "block_time")?;

    finish_transaction(RawTransaction {
        hash: data.hash,
        fee: data.fee,
        relayed_by: None,
        raw_time,
        inputs_count: data.inputs_count,
        inputs_value: data.inputs_value,
        outputs_count: data.outputs_count,
        outputs_value: data.outputs_value,
        balance: data.balance_diff,
        inputs: data.inputs,
        outputs: data.outputs,
    })
}
