//! Tests for error paths and edge cases

use tempfile::TempDir;
use utxo_ledger::*;
use utxo_ledger::block::new_block;
use utxo_ledger::encoding::{decode_block, encode_block};
use utxo_ledger::transaction::{new_coinbase_tx, new_spend_tx};

fn test_config(dir: &TempDir) -> ChainConfig {
    ChainConfig::new(dir.path().join("chain")).difficulty(8)
}

#[test]
fn test_operations_without_chain() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::new(test_config(&dir));

    assert!(matches!(ledger.get_balance("alice"), Err(LedgerError::ChainNotFound)));
    assert!(matches!(ledger.send("alice", "bob", 1), Err(LedgerError::ChainNotFound)));
    assert!(matches!(ledger.print_chain().err(), Some(LedgerError::ChainNotFound)));
}

#[test]
fn test_create_chain_twice() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::new(test_config(&dir));

    ledger.create_chain("alice").unwrap();
    assert!(matches!(ledger.create_chain("bob"), Err(LedgerError::ChainAlreadyExists)));
    assert_eq!(ledger.get_balance("bob").unwrap(), 0);
}

#[test]
fn test_invalid_difficulty_rejected() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::new(test_config(&dir).difficulty(0));

    assert!(matches!(ledger.create_chain("alice"), Err(LedgerError::InvalidConfig(_))));
}

#[test]
fn test_zero_amount_rejected() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::new(test_config(&dir));
    ledger.create_chain("alice").unwrap();

    assert!(matches!(ledger.send("alice", "bob", 0), Err(LedgerError::InvalidAmount(_))));
}

#[test]
fn test_unknown_sender_has_no_funds() {
    let dir = TempDir::new().unwrap();
    let chain = Blockchain::create(&test_config(&dir), "alice").unwrap();

    match new_spend_tx("mallory", "bob", 1, &chain) {
        Err(LedgerError::InsufficientFunds { available, .. }) => assert_eq!(available, 0),
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
}

#[test]
fn test_exhausted_nonce_space_keeps_tip() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    drop(Blockchain::create(&config, "alice").unwrap());

    // The stored difficulty (8) applies, but a one-nonce budget almost never suffices
    let chain = Blockchain::open(&config.clone().max_nonce(0)).unwrap();

    let mut failures = 0;
    for i in 0..4 {
        let tip = chain.tip().unwrap();
        match chain.mine_block(vec![new_coinbase_tx("alice", &format!("try {}", i)).unwrap()]) {
            Err(LedgerError::ExhaustedNonceSpace { max_nonce, .. }) => {
                assert_eq!(max_nonce, 0);
                failures += 1;
                assert_eq!(chain.tip().unwrap(), tip);
            }
            Ok(_) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
    assert!(failures > 0);
}

#[test]
fn test_corrupt_encoding_rejected() {
    let block = new_block(
        vec![new_coinbase_tx("alice", "").unwrap()],
        vec![1; 32],
        &PowConfig::with_difficulty(4),
    )
    .unwrap();

    let mut bytes = encode_block(&block).unwrap();
    bytes.truncate(bytes.len() / 2);
    assert!(matches!(decode_block(&bytes), Err(LedgerError::Serialization(_))));
}

#[test]
fn test_add_block_from_other_chain() {
    let dir = TempDir::new().unwrap();
    let other_dir = TempDir::new().unwrap();
    let chain = Blockchain::create(&test_config(&dir), "alice").unwrap();
    let other = Blockchain::create(&test_config(&other_dir), "bob").unwrap();

    let foreign = other
        .mine_block(vec![new_coinbase_tx("bob", "foreign").unwrap()])
        .unwrap();

    assert!(matches!(chain.add_block(&foreign), Err(LedgerError::CorruptBlock { .. })));
    assert_eq!(chain.len().unwrap(), 1);
}

#[test]
fn test_error_messages() {
    let err = LedgerError::InsufficientFunds {
        address: "alice".to_string(),
        available: 4,
        requested: 9,
    };
    assert_eq!(err.to_string(), "Not enough funds: alice has 4, needs 9");
    assert_eq!(LedgerError::ChainNotFound.to_string(), "No blockchain found. Create one first");
}
