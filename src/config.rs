//! Chain store and mining configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{LedgerError, Result};
use crate::pow::{target_for, ProofOfWork};
use crate::types::Block;

/// Mining parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowConfig {
    /// Leading zero bits required of every block hash
    pub difficulty: u32,
    /// Inclusive upper bound of the nonce search
    pub max_nonce: u64,
    /// Search nonces on the rayon thread pool
    pub parallel: bool,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_nonce: MAX_NONCE,
            parallel: false,
        }
    }
}

impl PowConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self { difficulty, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        target_for(self.difficulty)?;
        Ok(())
    }

    /// Search state for `block` under these parameters
    pub fn prepare(&self, block: &Block) -> Result<ProofOfWork> {
        Ok(ProofOfWork::prepare(block, self.difficulty)?
            .with_max_nonce(self.max_nonce)
            .with_parallel(self.parallel))
    }
}

/// Chain store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Directory of the sled database
    pub path: PathBuf,
    /// Mining parameters used for new chains and appended blocks
    pub pow: PowConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            pow: PowConfig::default(),
        }
    }
}

impl ChainConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn difficulty(mut self, difficulty: u32) -> Self {
        self.pow.difficulty = difficulty;
        self
    }

    pub fn max_nonce(mut self, max_nonce: u64) -> Self {
        self.pow.max_nonce = max_nonce;
        self
    }

    pub fn parallel_mining(mut self, parallel: bool) -> Self {
        self.pow.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LedgerError::InvalidConfig("empty chain path".to_string()));
        }
        self.pow.validate()
    }
}
