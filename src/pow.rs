//! Proof of work: hash preimage, target and validation
//!
//! A block hash is valid at difficulty `d` iff, read as a big-endian 256-bit
//! unsigned integer, it is strictly below `2^(256 - d)`. The preimage is
//!
//! ```text
//! prev_hash ‖ content_hash(transactions) ‖ be64(timestamp) ‖ be64(difficulty) ‖ be64(nonce)
//! ```

use crate::block::content_hash;
use crate::constants::*;
use crate::encoding::sha256;
use crate::error::{LedgerError, Result};
use crate::types::*;

/// Search state for one block: everything but the nonce is fixed.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    difficulty: u32,
    target: Hash,
    max_nonce: u64,
    parallel: bool,
    prefix: Vec<u8>,
}

impl ProofOfWork {
    /// Prepare a nonce search for `block` at `difficulty`.
    ///
    /// The block's own `nonce` and `hash` fields are ignored.
    pub fn prepare(block: &Block, difficulty: u32) -> Result<Self> {
        let target = target_for(difficulty)?;
        let contents = content_hash(&block.transactions);

        let mut prefix = Vec::with_capacity(block.prev_hash.len() + HASH_SIZE + 16);
        prefix.extend_from_slice(&block.prev_hash);
        prefix.extend_from_slice(&contents);
        prefix.extend_from_slice(&block.timestamp.to_be_bytes());
        prefix.extend_from_slice(&(difficulty as i64).to_be_bytes());

        Ok(Self {
            difficulty,
            target,
            max_nonce: MAX_NONCE,
            parallel: false,
            prefix,
        })
    }

    /// Bound the search to nonces `0..=max_nonce`
    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce;
        self
    }

    /// Spread the search over the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target(&self) -> &Hash {
        &self.target
    }

    pub fn max_nonce(&self) -> u64 {
        self.max_nonce
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Hash of the prepared preimage completed with `nonce`
    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        let mut data = Vec::with_capacity(self.prefix.len() + 8);
        data.extend_from_slice(&self.prefix);
        data.extend_from_slice(&nonce.to_be_bytes());
        sha256(&data)
    }

    pub fn meets_target(&self, hash: &Hash) -> bool {
        meets_target(hash, &self.target)
    }
}

/// Target for `difficulty`: `2^(256 - difficulty)` as big-endian bytes
pub fn target_for(difficulty: u32) -> Result<Hash> {
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
        return Err(LedgerError::InvalidConfig(format!(
            "difficulty {} outside {}..={}",
            difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY
        )));
    }

    let bit = 256 - difficulty as usize;
    let mut target = [0u8; 32];
    target[31 - bit / 8] = 1 << (bit % 8);
    Ok(target)
}

/// Big-endian comparison: `hash < target`
pub fn meets_target(hash: &Hash, target: &Hash) -> bool {
    hash < target
}

/// Number of leading zero bits of `hash`
pub fn leading_zero_bits(hash: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in hash {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// ValidateBlock: recompute the hash from the stored nonce and fields.
///
/// Valid iff every transaction id matches its contents, the recomputed hash is
/// below the target **and** it equals the stored `hash`. The preimage commits
/// to transaction ids only.
pub fn validate(block: &Block, difficulty: u32) -> Result<bool> {
    for tx in &block.transactions {
        if !tx.has_valid_id()? {
            return Ok(false);
        }
    }

    let pow = ProofOfWork::prepare(block, difficulty)?;
    let hash = pow.hash_with_nonce(block.nonce);

    Ok(pow.meets_target(&hash) && block.hash.as_slice() == hash.as_slice())
}
