//! Proof of ownership for spending outputs
//!
//! An output is locked with `lock_data`; an input spending it carries
//! `unlock_data`. [`Signer`] produces unlock data for an address and
//! [`Verifier`] decides whether unlock data opens a lock.
//!
//! [`PlainTextOwnership`] is the only implementation: the address itself is
//! the proof and verification is string equality. It offers no security and
//! exists so a signature scheme can be slotted in without touching
//! [`Transaction`](crate::types::Transaction).

pub trait Signer {
    /// Unlock data proving control of `address`
    fn prove(&self, address: &str) -> String;
}

pub trait Verifier {
    /// Whether `unlock_data` opens an output locked with `lock_data`
    fn verify(&self, lock_data: &str, unlock_data: &str) -> bool;
}

/// String-equality ownership: the address is its own proof
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlainTextOwnership;

impl Signer for PlainTextOwnership {
    fn prove(&self, address: &str) -> String {
        address.to_string()
    }
}

impl Verifier for PlainTextOwnership {
    fn verify(&self, lock_data: &str, unlock_data: &str) -> bool {
        lock_data == unlock_data
    }
}
