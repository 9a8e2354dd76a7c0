//! Core ledger types

use serde::{Deserialize, Serialize};

/// Byte string type (hashes, transaction ids)
pub type ByteString = Vec<u8>;

/// Hash type: 256-bit SHA-256 digest
pub type Hash = [u8; 32];

/// Transaction Input: references output `output_index` of transaction `txid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub txid: ByteString,
    pub output_index: i64,
    pub unlock_data: String,
}

/// Transaction Output: `value` credited to whoever can prove `lock_data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub lock_data: String,
}

/// Transaction: content-addressed list of inputs and outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: ByteString,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

/// Block: mined, hash-linked batch of transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub prev_hash: ByteString,
    pub hash: ByteString,
    pub nonce: u64,
}

/// Display projection of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub hash: String,
    pub prev_hash: String,
    pub timestamp: i64,
    pub nonce: u64,
    pub transactions: Vec<String>,
    pub pow_valid: bool,
}
