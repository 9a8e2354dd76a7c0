//! Block construction

use chrono::Utc;

use crate::config::PowConfig;
use crate::encoding::sha256;
use crate::error::Result;
use crate::mining;
use crate::pow;
use crate::types::*;

/// NewBlock: 𝒯𝒳* × ℍ → ℬ
///
/// Stamps the current time, mines a nonce under `pow_config` and returns the
/// finished block. Fails with `ExhaustedNonceSpace` if no nonce qualifies.
pub fn new_block(
    transactions: Vec<Transaction>,
    prev_hash: ByteString,
    pow_config: &PowConfig,
) -> Result<Block> {
    let mut block = Block {
        timestamp: Utc::now().timestamp(),
        transactions,
        prev_hash,
        hash: Vec::new(),
        nonce: 0,
    };

    let (nonce, hash) = mining::run(&pow_config.prepare(&block)?)?;
    block.nonce = nonce;
    block.hash = hash.to_vec();

    Ok(block)
}

/// Genesis block: a single coinbase with an empty previous hash
pub fn new_genesis_block(coinbase: Transaction, pow_config: &PowConfig) -> Result<Block> {
    new_block(vec![coinbase], Vec::new(), pow_config)
}

/// Ordered digest of the transaction ids (not a Merkle tree)
pub fn content_hash(transactions: &[Transaction]) -> Hash {
    let ids: Vec<u8> = transactions
        .iter()
        .flat_map(|tx| tx.id.iter().copied())
        .collect();
    sha256(&ids)
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }

    /// Display projection; `pow_valid` is checked at `difficulty`.
    ///
    /// Fails only when `difficulty` is out of range or a transaction cannot be
    /// encoded for its id check.
    pub fn view(&self, difficulty: u32) -> Result<BlockView> {
        Ok(BlockView {
            hash: hex::encode(&self.hash),
            prev_hash: hex::encode(&self.prev_hash),
            timestamp: self.timestamp,
            nonce: self.nonce,
            transactions: self.transactions.iter().map(|tx| hex::encode(&tx.id)).collect(),
            pow_valid: pow::validate(self, difficulty)?,
        })
    }
}
