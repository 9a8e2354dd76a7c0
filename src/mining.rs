//! Nonce search and block mining

use rayon::prelude::*;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::pow::{leading_zero_bits, ProofOfWork};
use crate::types::*;

/// RunProofOfWork: search nonces `0..=max_nonce` in order.
///
/// Returns the lowest valid nonce and its hash. The parallel search yields the
/// same result as the sequential one. Exhausting the range is an error, the
/// nonce never wraps.
pub fn run(pow: &ProofOfWork) -> Result<(u64, Hash)> {
    debug!(
        difficulty = pow.difficulty(),
        max_nonce = pow.max_nonce(),
        parallel = pow.is_parallel(),
        "Mining block"
    );

    let found = if pow.is_parallel() {
        (0..=pow.max_nonce())
            .into_par_iter()
            .find_map_first(|nonce| try_nonce(pow, nonce))
    } else {
        (0..=pow.max_nonce()).find_map(|nonce| try_nonce(pow, nonce))
    };

    match found {
        Some((nonce, hash)) => {
            debug!(
                nonce,
                zero_bits = leading_zero_bits(&hash),
                hash = %hex::encode(hash),
                "Found valid nonce"
            );
            Ok((nonce, hash))
        }
        None => Err(LedgerError::ExhaustedNonceSpace {
            max_nonce: pow.max_nonce(),
            difficulty: pow.difficulty(),
        }),
    }
}

fn try_nonce(pow: &ProofOfWork, nonce: u64) -> Option<(u64, Hash)> {
    let hash = pow.hash_with_nonce(nonce);
    pow.meets_target(&hash).then_some((nonce, hash))
}
