//! Error types for the ledger

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Cannot open chain store at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },

    #[error("Store operation '{op}' failed on key {key}: {source}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: sled::Error,
    },

    #[error("Blockchain already exists")]
    ChainAlreadyExists,

    #[error("No blockchain found. Create one first")]
    ChainNotFound,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Nonce space exhausted after {max_nonce} attempts at difficulty {difficulty}")]
    ExhaustedNonceSpace { max_nonce: u64, difficulty: u32 },

    #[error("Not enough funds: {address} has {available}, needs {requested}")]
    InsufficientFunds {
        address: String,
        available: u64,
        requested: u64,
    },

    #[error("Corrupt block {hash}: {reason}")]
    CorruptBlock { hash: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl LedgerError {
    pub(crate) fn store(op: &'static str, key: &[u8], source: sled::Error) -> Self {
        LedgerError::Store {
            op,
            key: hex::encode(key),
            source,
        }
    }

    pub(crate) fn corrupt(hash: &[u8], reason: impl Into<String>) -> Self {
        LedgerError::CorruptBlock {
            hash: hex::encode(hash),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
