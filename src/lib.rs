//! # utxo-ledger
//!
//! A single-node, append-only ledger of proof-of-work blocks holding
//! transactions under an unspent-transaction-output model.
//!
//! ## Architecture
//!
//! Leaves first:
//! - `encoding`: deterministic versioned encoding and SHA-256
//! - `pow` / `mining`: target, validation and nonce search
//! - `block`: block construction
//! - `chain`: sled-backed store with tip pointer and backward cursor
//! - `utxo`: unspent output scanning and selection
//! - `transaction`: coinbase and spend builders
//!
//! A spend flows through all of them: the UTXO scan selects outputs of the
//! sender, the builder assembles and content-addresses the transaction, the
//! miner finds a nonce for a block holding it, and the store appends the block
//! and moves the tip in one atomic batch.
//!
//! ## Usage
//!
//! ```rust
//! use utxo_ledger::{ChainConfig, Ledger};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let ledger = Ledger::new(ChainConfig::new(dir.path().join("chain")).difficulty(8));
//!
//! ledger.create_chain("alice").unwrap();
//! ledger.send("alice", "bob", 3).unwrap();
//!
//! assert_eq!(ledger.get_balance("alice").unwrap(), 4);
//! assert_eq!(ledger.get_balance("bob").unwrap(), 3);
//! ```

pub mod types;
pub mod constants;
pub mod config;
pub mod encoding;
pub mod pow;
pub mod mining;
pub mod block;
pub mod chain;
pub mod ownership;
pub mod transaction;
pub mod utxo;
pub mod error;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use config::{ChainConfig, PowConfig};
pub use chain::{Blockchain, BlockchainIterator};
pub use error::{LedgerError, Result};

use std::sync::{Mutex, PoisonError};

use sled::Db;
use tracing::info;

/// The operations exposed to a command-line front end.
///
/// The chain store is opened on first use and the handle is kept for the life
/// of the `Ledger`. Every operation, and every `print_chain` cursor, shares it.
pub struct Ledger {
    config: ChainConfig,
    store: Mutex<Option<Db>>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            store: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Handle to the chain, sharing this ledger's open store
    pub fn blockchain(&self) -> Result<Blockchain> {
        Blockchain::open_in(self.store(false)?, &self.config)
    }

    /// The open store, opening it first if needed. Without `create`, a missing
    /// store directory is `ChainNotFound` and nothing is created on disk.
    fn store(&self, create: bool) -> Result<Db> {
        self.config.validate()?;

        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(db) = store.as_ref() {
            return Ok(db.clone());
        }
        if !create && !self.config.path.exists() {
            return Err(LedgerError::ChainNotFound);
        }

        let db = chain::open_db(&self.config.path)?;
        *store = Some(db.clone());
        Ok(db)
    }

    /// Create a new chain whose genesis block rewards `address`
    ///
    /// # Examples
    ///
    /// ```
    /// use utxo_ledger::{ChainConfig, Ledger, LedgerError};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let ledger = Ledger::new(ChainConfig::new(dir.path().join("chain")).difficulty(8));
    ///
    /// ledger.create_chain("alice").unwrap();
    /// assert!(matches!(ledger.create_chain("alice"), Err(LedgerError::ChainAlreadyExists)));
    /// ```
    pub fn create_chain(&self, address: &str) -> Result<()> {
        Blockchain::create_in(self.store(true)?, &self.config, address)?;
        Ok(())
    }

    /// Sum of the unspent outputs of `address`
    pub fn get_balance(&self, address: &str) -> Result<u64> {
        let chain = self.blockchain()?;
        utxo::get_balance(&chain, address)
    }

    /// Move `amount` from `from` to `to` in a newly mined block
    ///
    /// Fails with `InsufficientFunds` without touching the chain when `from`
    /// cannot cover `amount`.
    pub fn send(&self, from: &str, to: &str, amount: u64) -> Result<()> {
        let chain = self.blockchain()?;
        let tx = transaction::new_spend_tx(from, to, amount, &chain)?;
        let block = chain.mine_block(vec![tx])?;

        info!(from, to, amount, block = %hex::encode(&block.hash), "Sent");
        Ok(())
    }

    /// Views of every block, tip first
    ///
    /// # Examples
    ///
    /// ```
    /// use utxo_ledger::{ChainConfig, Ledger};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let ledger = Ledger::new(ChainConfig::new(dir.path().join("chain")).difficulty(8));
    /// ledger.create_chain("alice").unwrap();
    ///
    /// let views: Vec<_> = ledger.print_chain().unwrap().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(views.len(), 1);
    /// assert!(views[0].pow_valid);
    /// ```
    pub fn print_chain(&self) -> Result<impl Iterator<Item = Result<BlockView>>> {
        let chain = self.blockchain()?;
        let difficulty = chain.difficulty();
        Ok(chain
            .iterator()?
            .map(move |block| block.and_then(|block| block.view(difficulty))))
    }
}
