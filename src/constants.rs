//! Ledger constants

/// Value minted by every coinbase transaction
pub const SUBSIDY: u64 = 7;

/// Leading zero bits required of a block hash unless configured otherwise
pub const DEFAULT_DIFFICULTY: u32 = 16;

/// Smallest accepted difficulty
pub const MIN_DIFFICULTY: u32 = 1;

/// Largest accepted difficulty (target 2^1)
pub const MAX_DIFFICULTY: u32 = 255;

/// Inclusive upper bound of the nonce search
pub const MAX_NONCE: u64 = i64::MAX as u64;

/// Size of a SHA-256 digest in bytes
pub const HASH_SIZE: usize = 32;

/// Output index carried by the single input of a coinbase transaction
pub const COINBASE_OUTPUT_INDEX: i64 = -1;

/// Coinbase data of the genesis block
pub const GENESIS_COINBASE_DATA: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

/// Leading byte of every persisted value
pub const ENCODING_VERSION: u8 = 1;

/// Name of the sled tree holding blocks and the reserved keys below
pub const BLOCKS_TREE: &str = "blocks";

/// Reserved key holding the tip hash
pub const TIP_KEY: &[u8] = b"l";

/// Reserved key holding the genesis hash
pub const GENESIS_KEY: &[u8] = b"g";

/// Reserved key holding the difficulty the chain was mined at
pub const DIFFICULTY_KEY: &[u8] = b"d";

/// Default location of the chain store
pub const DEFAULT_DB_PATH: &str = "ledger.db";
