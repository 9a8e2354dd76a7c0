//! Deterministic binary encoding and hashing of ledger records
//!
//! Every persisted value is `ENCODING_VERSION ‖ bincode(value)` with fixed-width
//! integers. Decoding rejects unknown versions and trailing bytes, so
//! `encode(decode(bytes)) == bytes` for any accepted input.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::constants::ENCODING_VERSION;
use crate::error::{LedgerError, Result};
use crate::types::*;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

/// Encode a value with the version prefix
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let body = codec()
        .serialize(value)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;

    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.push(ENCODING_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a value produced by [`encode`]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (version, body) = bytes
        .split_first()
        .ok_or_else(|| LedgerError::Serialization("empty input".to_string()))?;

    if *version != ENCODING_VERSION {
        return Err(LedgerError::Serialization(format!(
            "unsupported encoding version {}",
            version
        )));
    }

    codec()
        .deserialize(body)
        .map_err(|e| LedgerError::Serialization(e.to_string()))
}

pub fn encode_block(block: &Block) -> Result<Vec<u8>> {
    encode(block)
}

pub fn decode_block(bytes: &[u8]) -> Result<Block> {
    decode(bytes)
}

pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>> {
    encode(tx)
}

pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction> {
    decode(bytes)
}

/// SHA-256 of `data`
pub fn sha256(data: &[u8]) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}
