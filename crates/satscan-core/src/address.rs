//! Base58Check address decoding.
//!
//! A legacy Bitcoin address is `base58(version || hash160 || checksum)` where
//! the checksum is the first four bytes of SHA-256d over `version || hash160`.
//! Alphabet and checksum validation are delegated to the `bitcoin` crate's
//! `base58` module.

use std::fmt;

use bitcoin::base58;
use bitcoin::hex::{DisplayHex, FromHex};
use serde::{Serialize, Serializer};

use crate::error::CoreError;

// ==============================================================================
// Hash160
// ==============================================================================

/// The raw hash identifying a wallet, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash160(Vec<u8>);

impl Hash160 {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a hash supplied directly by the upstream.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        Vec::<u8>::from_hex(hex)
            .map(Self)
            .map_err(|e| CoreError::Decode(format!("invalid hash160 `{hex}`: {e}")))
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_lower_hex_string())
    }
}

impl Serialize for Hash160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ==============================================================================
// Decoded Address
// ==============================================================================

/// A checksum-validated Base58Check payload split into its version byte and
/// the hash that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    version: u8,
    hash160: Hash160,
}

impl DecodedAddress {
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash160(&self) -> &Hash160 {
        &self.hash160
    }

    pub fn into_hash160(self) -> Hash160 {
        self.hash160
    }

    /// The full decoded payload, version byte first.
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(1 + self.hash160.0.len());
        payload.push(self.version);
        payload.extend_from_slice(&self.hash160.0);
        payload
    }

    /// Re-encode as Base58Check. Inverse of [`derive_hash160`].
    pub fn to_address(&self) -> String {
        base58::encode_check(&self.payload())
    }
}

/// Decode a Base58Check address into its version byte and hash160.
///
/// Fails with [`CoreError::InvalidAddress`] on characters outside the
/// base-58 alphabet, a checksum mismatch, or a payload too short to carry a
/// version byte. This is a permanent input error, never retried.
pub fn derive_hash160(address: &str) -> Result<DecodedAddress, CoreError> {
    let invalid = |reason: String| CoreError::InvalidAddress {
        address: address.to_owned(),
        reason,
    };

    let payload = base58::decode_check(address).map_err(|e| invalid(e.to_string()))?;
    let (version, hash) = payload
        .split_first()
        .ok_or_else(|| invalid("empty payload".to_owned()))?;

    Ok(DecodedAddress {
        version: *version,
        hash160: Hash160(hash.to_vec()),
    })
}
