//! Persistent chain store
//!
//! Blocks live in a single sled tree keyed by their 32-byte hash. Three
//! reserved one-byte keys sit beside them:
//!
//! - `l`: hash of the tip
//! - `g`: hash of the genesis block
//! - `d`: difficulty the chain was mined at (big-endian u32)
//!
//! Every mutation is one `Batch` applied with `apply_batch`, so a block is
//! never visible without its tip update or the other way round.

use std::path::Path;

use sled::{Batch, Db, Tree};
use tracing::{debug, info, warn};

use crate::block::{new_block, new_genesis_block};
use crate::config::{ChainConfig, PowConfig};
use crate::constants::*;
use crate::encoding::{decode_block, encode_block};
use crate::error::{LedgerError, Result};
use crate::pow;
use crate::transaction::new_coinbase_tx;
use crate::types::*;

/// Handle to an open chain
pub struct Blockchain {
    db: Db,
    blocks: Tree,
    pow: PowConfig,
}

impl std::fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blockchain")
            .field("difficulty", &self.pow.difficulty)
            .field("blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

impl Blockchain {
    /// Open an existing chain. Nothing is created on disk if it is missing.
    pub fn open(config: &ChainConfig) -> Result<Self> {
        config.validate()?;
        if !config.path.exists() {
            return Err(LedgerError::ChainNotFound);
        }

        Self::open_in(open_db(&config.path)?, config)
    }

    /// Open the chain held by an already open store
    pub fn open_in(db: Db, config: &ChainConfig) -> Result<Self> {
        config.validate()?;
        let blocks = open_blocks(&db, &config.path)?;
        if read_key(&blocks, TIP_KEY)?.is_none() {
            return Err(LedgerError::ChainNotFound);
        }

        Self::load(db, blocks, config.pow)
    }

    /// Create a chain whose genesis coinbase pays `address`
    pub fn create(config: &ChainConfig, address: &str) -> Result<Self> {
        config.validate()?;
        Self::create_in(open_db(&config.path)?, config, address)
    }

    /// Create a chain inside an already open store
    pub fn create_in(db: Db, config: &ChainConfig, address: &str) -> Result<Self> {
        config.validate()?;
        let blocks = open_blocks(&db, &config.path)?;
        if read_key(&blocks, TIP_KEY)?.is_some() {
            return Err(LedgerError::ChainAlreadyExists);
        }

        Self::init(db, blocks, config.pow, address)
    }

    /// Open the chain at `config.path`, creating it for `address` if absent
    pub fn open_or_create(config: &ChainConfig, address: &str) -> Result<Self> {
        config.validate()?;
        let db = open_db(&config.path)?;
        let blocks = open_blocks(&db, &config.path)?;
        if read_key(&blocks, TIP_KEY)?.is_some() {
            Self::load(db, blocks, config.pow)
        } else {
            Self::init(db, blocks, config.pow, address)
        }
    }

    fn init(db: Db, blocks: Tree, pow: PowConfig, address: &str) -> Result<Self> {
        let coinbase = new_coinbase_tx(address, GENESIS_COINBASE_DATA)?;
        let genesis = new_genesis_block(coinbase, &pow)?;
        let encoded = encode_block(&genesis)?;

        let mut batch = Batch::default();
        batch.insert(genesis.hash.as_slice(), encoded);
        batch.insert(TIP_KEY, genesis.hash.as_slice());
        batch.insert(GENESIS_KEY, genesis.hash.as_slice());
        batch.insert(DIFFICULTY_KEY, &pow.difficulty.to_be_bytes()[..]);
        blocks
            .apply_batch(batch)
            .map_err(|e| LedgerError::store("create genesis", &genesis.hash, e))?;
        db.flush().map_err(|e| LedgerError::store("flush", &genesis.hash, e))?;

        info!(
            hash = %hex::encode(&genesis.hash),
            difficulty = pow.difficulty,
            address,
            "Created blockchain"
        );

        Ok(Self { db, blocks, pow })
    }

    fn load(db: Db, blocks: Tree, mut pow: PowConfig) -> Result<Self> {
        let tip = read_key(&blocks, TIP_KEY)?.ok_or(LedgerError::ChainNotFound)?;
        let stored = read_key(&blocks, DIFFICULTY_KEY)?
            .ok_or_else(|| LedgerError::corrupt(&tip, "chain has no difficulty record"))?;
        let stored: [u8; 4] = stored.as_slice().try_into().map_err(|_| {
            LedgerError::corrupt(&tip, format!("bad difficulty record of {} bytes", stored.len()))
        })?;
        let stored = u32::from_be_bytes(stored);

        if stored != pow.difficulty {
            warn!(
                configured = pow.difficulty,
                stored,
                "Configured difficulty differs from the chain's, using the chain's"
            );
            pow.difficulty = stored;
        }

        debug!(difficulty = pow.difficulty, "Opened blockchain");
        Ok(Self { db, blocks, pow })
    }

    /// Difficulty every block of this chain is mined and validated at
    pub fn difficulty(&self) -> u32 {
        self.pow.difficulty
    }

    /// Hash of the most recently appended block
    pub fn tip(&self) -> Result<ByteString> {
        read_key(&self.blocks, TIP_KEY)?.ok_or(LedgerError::ChainNotFound)
    }

    pub fn genesis_hash(&self) -> Result<ByteString> {
        read_key(&self.blocks, GENESIS_KEY)?.ok_or(LedgerError::ChainNotFound)
    }

    /// Block stored under `hash`, if any. The block is not validated.
    pub fn get_block(&self, hash: &[u8]) -> Result<Option<Block>> {
        read_key(&self.blocks, hash)?
            .map(|bytes| decode_block(&bytes))
            .transpose()
    }

    /// MineBlock: mine `transactions` on top of the tip and persist the block.
    ///
    /// The block and the new tip pointer are written in one batch. On any
    /// failure the tip is left unchanged.
    pub fn mine_block(&self, transactions: Vec<Transaction>) -> Result<Block> {
        let tip = self.tip()?;
        let block = new_block(transactions, tip, &self.pow)?;
        self.commit(&block)?;

        info!(
            hash = %hex::encode(&block.hash),
            nonce = block.nonce,
            transactions = block.transactions.len(),
            "Mined block"
        );
        Ok(block)
    }

    /// AddBlock: admit a block mined elsewhere.
    ///
    /// The block must carry a previous hash equal to the tip, hold only
    /// transactions whose ids match their contents and satisfy the chain's
    /// proof of work, otherwise `CorruptBlock`.
    pub fn add_block(&self, block: &Block) -> Result<()> {
        if block.is_genesis() {
            return Err(LedgerError::corrupt(
                &block.hash,
                "only the first block may have an empty previous hash",
            ));
        }

        let tip = self.tip()?;
        if block.prev_hash != tip {
            return Err(LedgerError::corrupt(
                &block.hash,
                format!("previous hash {} is not the tip", hex::encode(&block.prev_hash)),
            ));
        }

        check_block(block, self.pow.difficulty)?;

        self.commit(block)?;
        info!(hash = %hex::encode(&block.hash), "Added block");
        Ok(())
    }

    fn commit(&self, block: &Block) -> Result<()> {
        let encoded = encode_block(block)?;

        let mut batch = Batch::default();
        batch.insert(block.hash.as_slice(), encoded);
        batch.insert(TIP_KEY, block.hash.as_slice());
        self.blocks
            .apply_batch(batch)
            .map_err(|e| LedgerError::store("append block", &block.hash, e))?;
        self.db
            .flush()
            .map_err(|e| LedgerError::store("flush", &block.hash, e))?;
        Ok(())
    }

    /// Cursor from the tip back to genesis
    pub fn iterator(&self) -> Result<BlockchainIterator> {
        Ok(BlockchainIterator {
            current_hash: self.tip()?,
            genesis_hash: self.genesis_hash()?,
            blocks: self.blocks.clone(),
            difficulty: self.pow.difficulty,
            done: false,
        })
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        let mut cursor = self.iterator()?;
        while cursor.next_block()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

/// Backward cursor over the chain.
///
/// Every block is checked as it is loaded: it must decode, be stored under its
/// own hash, carry transaction ids matching their contents, satisfy the proof
/// of work, and only the recorded genesis may have
/// an empty previous hash. The first failure is returned as `CorruptBlock` and
/// ends the walk.
pub struct BlockchainIterator {
    current_hash: ByteString,
    genesis_hash: ByteString,
    blocks: Tree,
    difficulty: u32,
    done: bool,
}

impl BlockchainIterator {
    /// Next block towards genesis, `None` once genesis has been yielded
    pub fn next_block(&mut self) -> Result<Option<Block>> {
        if self.done {
            return Ok(None);
        }

        match self.load_current() {
            Ok(block) => {
                if block.is_genesis() {
                    self.done = true;
                } else {
                    self.current_hash = block.prev_hash.clone();
                }
                Ok(Some(block))
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    fn load_current(&self) -> Result<Block> {
        let hash = &self.current_hash;
        let bytes = read_key(&self.blocks, hash)?
            .ok_or_else(|| LedgerError::corrupt(hash, "block missing from store"))?;
        let block = decode_block(&bytes)
            .map_err(|e| LedgerError::corrupt(hash, format!("undecodable: {}", e)))?;

        if block.hash != *hash {
            return Err(LedgerError::corrupt(hash, "stored under a different hash"));
        }
        check_block(&block, self.difficulty)?;
        if block.is_genesis() && block.hash != self.genesis_hash {
            return Err(LedgerError::corrupt(
                hash,
                "only the first block may have an empty previous hash",
            ));
        }

        Ok(block)
    }
}

impl Iterator for BlockchainIterator {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

/// `CorruptBlock` unless every transaction id matches its contents and the
/// proof of work holds at `difficulty`
fn check_block(block: &Block, difficulty: u32) -> Result<()> {
    for tx in &block.transactions {
        if !tx.has_valid_id()? {
            return Err(LedgerError::corrupt(&block.hash, "transaction id mismatch"));
        }
    }
    if !pow::validate(block, difficulty)? {
        return Err(LedgerError::corrupt(&block.hash, "fails proof of work"));
    }
    Ok(())
}

/// Open the sled store at `path`. One process holds it at a time.
pub fn open_db(path: &Path) -> Result<Db> {
    sled::open(path).map_err(|source| LedgerError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn open_blocks(db: &Db, path: &Path) -> Result<Tree> {
    db.open_tree(BLOCKS_TREE)
        .map_err(|source| LedgerError::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

fn read_key(tree: &Tree, key: &[u8]) -> Result<Option<ByteString>> {
    tree.get(key)
        .map(|value| value.map(|v| v.to_vec()))
        .map_err(|e| LedgerError::store("get", key, e))
}
