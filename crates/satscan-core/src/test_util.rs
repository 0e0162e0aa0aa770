//! Shared test helpers for `satscan-core` unit tests.
//!
//! Canned addresses, upstream response bodies for both schema variants, and
//! record builders, so that tests across modules share a single source of
//! truth for dummy data construction.

use serde_json::json;
use time::OffsetDateTime;

use crate::types::TransactionInfo;

// ==============================================================================
// Addresses
// ==============================================================================

/// Address paid by the genesis block coinbase.
pub const GENESIS_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

/// Hash160 of [`GENESIS_ADDRESS`], without the version byte.
pub const GENESIS_HASH160: &str = "62e907b15cbf27d5425399ebf6f0fb50ebb88f18";

pub const BASE_URL: &str = "https://api.test";

// ==============================================================================
// Record Builders
// ==============================================================================

/// Build a minimal `TransactionInfo` with the given hash and epoch time.
pub fn make_tx(hash: &str, raw_time: i64) -> TransactionInfo {
    TransactionInfo {
        hash: hash.to_owned(),
        fee: 0,
        relayed_by: None,
        time: OffsetDateTime::from_unix_timestamp(raw_time).expect("test epoch in range"),
        raw_time,
        inputs_count: 0,
        inputs_value: 0,
        outputs_count: 0,
        outputs_value: 0,
        balance: 0,
        inputs: Vec::new(),
        outputs: Vec::new(),
    }
}

// ==============================================================================
// Enveloped Variant Bodies
// ==============================================================================

pub fn enveloped_tx_json(hash: &str, block_time: i64) -> serde_json::Value {
    json!({
        "hash": hash,
        "fee": 1000,
        "block_time": block_time,
        "inputs_count": 1,
        "inputs_value": 51000,
        "outputs_count": 2,
        "outputs_value": 50000,
        "balance_diff": -20000,
        "inputs": [{ "prev_addresses": [GENESIS_ADDRESS], "prev_value": 51000 }],
        "outputs": [
            { "addresses": ["1BoatSLRHtKNngkdXEeobR76b53LETtpyT"], "value": 30000 },
            { "addresses": [GENESIS_ADDRESS], "value": 20000 }
        ]
    })
}

pub fn enveloped_wallet_body(address: &str) -> String {
    json!({
        "status": "success",
        "msg": "",
        "err_code": 0,
        "data": {
            "address": address,
            "tx_count": 12,
            "unspent_tx_count": 3,
            "received": 700,
            "sent": 200,
            "balance": 500
        }
    })
    .to_string()
}

/// A listing page holding one transaction per hash, `block_time` = index.
pub fn enveloped_page_body(hashes: &[&str]) -> String {
    let list: Vec<_> = hashes
        .iter()
        .enumerate()
        .map(|(i, hash)| enveloped_tx_json(hash, i as i64))
        .collect();
    json!({
        "status": "success",
        "msg": "",
        "err_code": 0,
        "data": {
            "list": list,
            "page": 1,
            "pagesize": 50,
            "page_total": 1,
            "total_count": hashes.len()
        }
    })
    .to_string()
}

// ==============================================================================
// Flat Variant Bodies
// ==============================================================================

pub fn flat_tx_json(hash: &str, time: i64) -> serde_json::Value {
    json!({
        "hash": hash,
        "fee": 226,
        "relayed_by": "0.0.0.0",
        "time": time,
        "vin_sz": 1,
        "vout_sz": 2,
        "result": 5000,
        "inputs": [{
            "sequence": 4294967295u64,
            "prev_out": { "addr": GENESIS_ADDRESS, "value": 10226 }
        }],
        "out": [
            { "addr": "1BoatSLRHtKNngkdXEeobR76b53LETtpyT", "value": 5000 },
            { "addr": GENESIS_ADDRESS, "value": 5000 }
        ]
    })
}

pub fn flat_page_body(hashes: &[&str]) -> String {
    let txs: Vec<_> = hashes
        .iter()
        .enumerate()
        .map(|(i, hash)| flat_tx_json(hash, i as i64))
        .collect();
    json!({
        "hash160": GENESIS_HASH160,
        "address": GENESIS_ADDRESS,
        "n_tx": hashes.len(),
        "txs": txs
    })
    .to_string()
}
