//! UTXO scanning and selection
//!
//! The unspent set is derived, never stored: every query walks the chain from
//! the tip back to genesis. Inputs are recorded as spent before any output of
//! the same block is evaluated, so an output consumed later in the walk (or
//! later in the same block, or by its own transaction) is never reported.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::chain::Blockchain;
use crate::error::Result;
use crate::ownership::{PlainTextOwnership, Signer, Verifier};
use crate::types::*;

/// Selected outputs: transaction id → output indices
pub type SpendableOutputs = BTreeMap<ByteString, Vec<i64>>;

/// One transaction together with the indices of its unspent outputs owned by
/// the queried address (never empty)
struct UnspentEntry {
    tx: Transaction,
    indices: Vec<usize>,
}

fn scan_unspent<O: Signer + Verifier>(
    chain: &Blockchain,
    address: &str,
    ownership: &O,
) -> Result<Vec<UnspentEntry>> {
    let proof = ownership.prove(address);
    let mut spent: HashMap<ByteString, HashSet<i64>> = HashMap::new();
    let mut unspent = Vec::new();

    for block in chain.iterator()? {
        let block = block?;

        for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
            for input in &tx.inputs {
                if input.can_unlock_output_with(address, ownership) {
                    spent
                        .entry(input.txid.clone())
                        .or_default()
                        .insert(input.output_index);
                }
            }
        }

        for tx in &block.transactions {
            let spent_here = spent.get(&tx.id);
            let indices: Vec<usize> = tx
                .outputs
                .iter()
                .enumerate()
                .filter(|(i, output)| {
                    output.can_be_unlocked_with(&proof, ownership)
                        && !spent_here.map_or(false, |set| set.contains(&(*i as i64)))
                })
                .map(|(i, _)| i)
                .collect();

            if !indices.is_empty() {
                unspent.push(UnspentEntry { tx: tx.clone(), indices });
            }
        }
    }

    Ok(unspent)
}

/// Transactions holding at least one unspent output of `address`, tip first
pub fn find_unspent_transactions(chain: &Blockchain, address: &str) -> Result<Vec<Transaction>> {
    find_unspent_transactions_with(chain, address, &PlainTextOwnership)
}

pub fn find_unspent_transactions_with<O: Signer + Verifier>(
    chain: &Blockchain,
    address: &str,
    ownership: &O,
) -> Result<Vec<Transaction>> {
    Ok(scan_unspent(chain, address, ownership)?
        .into_iter()
        .map(|entry| entry.tx)
        .collect())
}

/// FindSpendableOutputs: 𝒜 × ℕ → ℕ × (ℍ → ℕ*)
///
/// Accumulates unspent outputs of `address` in scan order until the total
/// reaches `amount`. A returned total below `amount` means insufficient funds.
pub fn find_spendable_outputs(
    chain: &Blockchain,
    address: &str,
    amount: u64,
) -> Result<(u64, SpendableOutputs)> {
    find_spendable_outputs_with(chain, address, amount, &PlainTextOwnership)
}

pub fn find_spendable_outputs_with<O: Signer + Verifier>(
    chain: &Blockchain,
    address: &str,
    amount: u64,
    ownership: &O,
) -> Result<(u64, SpendableOutputs)> {
    let mut accumulated = 0u64;
    let mut selected = SpendableOutputs::new();

    'work: for entry in scan_unspent(chain, address, ownership)? {
        for index in entry.indices {
            if accumulated >= amount {
                break 'work;
            }
            accumulated = accumulated.saturating_add(entry.tx.outputs[index].value);
            selected
                .entry(entry.tx.id.clone())
                .or_default()
                .push(index as i64);
        }
    }

    debug!(address, amount, accumulated, selected = selected.len(), "Selected spendable outputs");
    Ok((accumulated, selected))
}

/// Every unspent output of `address`
pub fn find_utxo(chain: &Blockchain, address: &str) -> Result<Vec<TxOutput>> {
    find_utxo_with(chain, address, &PlainTextOwnership)
}

pub fn find_utxo_with<O: Signer + Verifier>(
    chain: &Blockchain,
    address: &str,
    ownership: &O,
) -> Result<Vec<TxOutput>> {
    Ok(scan_unspent(chain, address, ownership)?
        .into_iter()
        .flat_map(|entry| {
            let UnspentEntry { tx, indices } = entry;
            indices.into_iter().map(move |i| tx.outputs[i].clone())
        })
        .collect())
}

/// Sum of the unspent outputs of `address`
pub fn get_balance(chain: &Blockchain, address: &str) -> Result<u64> {
    Ok(find_utxo(chain, address)?
        .iter()
        .fold(0u64, |total, output| total.saturating_add(output.value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::constants::SUBSIDY;
    use crate::transaction::{new_coinbase_tx, new_spend_tx};
    use tempfile::TempDir;

    fn new_chain(dir: &TempDir, address: &str) -> Blockchain {
        let config = ChainConfig::new(dir.path().join("chain")).difficulty(8);
        Blockchain::create(&config, address).unwrap()
    }

    #[test]
    fn test_genesis_balance() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        assert_eq!(get_balance(&chain, "alice").unwrap(), SUBSIDY);
        assert_eq!(get_balance(&chain, "bob").unwrap(), 0);
        assert_eq!(find_unspent_transactions(&chain, "alice").unwrap().len(), 1);
        assert!(find_unspent_transactions(&chain, "bob").unwrap().is_empty());
    }

    #[test]
    fn test_spend_with_change() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        let tx = new_spend_tx("alice", "bob", 3, &chain).unwrap();
        chain.mine_block(vec![tx]).unwrap();

        assert_eq!(get_balance(&chain, "alice").unwrap(), 4);
        assert_eq!(get_balance(&chain, "bob").unwrap(), 3);

        let alice = find_utxo(&chain, "alice").unwrap();
        assert_eq!(alice, vec![TxOutput { value: 4, lock_data: "alice".to_string() }]);
    }

    #[test]
    fn test_full_spend_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        let tx = new_spend_tx("alice", "bob", SUBSIDY, &chain).unwrap();
        assert_eq!(tx.outputs.len(), 1);
        chain.mine_block(vec![tx]).unwrap();

        let (accumulated, selected) = find_spendable_outputs(&chain, "alice", 1).unwrap();
        assert_eq!(accumulated, 0);
        assert!(selected.is_empty());
        assert_eq!(get_balance(&chain, "bob").unwrap(), SUBSIDY);
    }

    #[test]
    fn test_spendable_outputs_stop_early() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");
        chain.mine_block(vec![new_coinbase_tx("alice", "second").unwrap()]).unwrap();
        chain.mine_block(vec![new_coinbase_tx("alice", "third").unwrap()]).unwrap();

        let (accumulated, selected) = find_spendable_outputs(&chain, "alice", 5).unwrap();
        assert_eq!(accumulated, SUBSIDY);
        assert_eq!(selected.len(), 1);

        let (accumulated, selected) = find_spendable_outputs(&chain, "alice", SUBSIDY + 1).unwrap();
        assert_eq!(accumulated, 2 * SUBSIDY);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_spendable_outputs_short_of_amount() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        let (accumulated, selected) = find_spendable_outputs(&chain, "alice", 100).unwrap();
        assert_eq!(accumulated, SUBSIDY);
        assert_eq!(selected.values().map(Vec::len).sum::<usize>(), 1);
    }

    #[test]
    fn test_partially_spent_transaction_only_offers_unspent_outputs() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        // alice -> alice:3 with change alice:4; then spend only the first output
        let split = new_spend_tx("alice", "alice", 3, &chain).unwrap();
        let split_id = split.id.clone();
        chain.mine_block(vec![split]).unwrap();

        let mut spend = Transaction {
            id: Vec::new(),
            inputs: vec![TxInput {
                txid: split_id.clone(),
                output_index: 0,
                unlock_data: "alice".to_string(),
            }],
            outputs: vec![TxOutput { value: 3, lock_data: "bob".to_string() }],
        };
        spend.set_id().unwrap();
        chain.mine_block(vec![spend]).unwrap();

        let (accumulated, selected) = find_spendable_outputs(&chain, "alice", 10).unwrap();
        assert_eq!(accumulated, 4);
        assert_eq!(selected.get(&split_id), Some(&vec![1]));
    }

    #[test]
    fn test_inputs_in_same_block_count_as_spent() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        let funding = new_coinbase_tx("carol", "funding").unwrap();
        let mut spend = Transaction {
            id: Vec::new(),
            inputs: vec![TxInput {
                txid: funding.id.clone(),
                output_index: 0,
                unlock_data: "carol".to_string(),
            }],
            outputs: vec![TxOutput { value: SUBSIDY, lock_data: "dave".to_string() }],
        };
        spend.set_id().unwrap();
        chain.mine_block(vec![funding, spend]).unwrap();

        assert_eq!(get_balance(&chain, "carol").unwrap(), 0);
        assert_eq!(get_balance(&chain, "dave").unwrap(), SUBSIDY);
    }

    #[test]
    fn test_unspent_transactions_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        let chain = new_chain(&dir, "alice");

        let mut tx = Transaction {
            id: Vec::new(),
            inputs: vec![],
            outputs: vec![
                TxOutput { value: 1, lock_data: "erin".to_string() },
                TxOutput { value: 2, lock_data: "erin".to_string() },
            ],
        };
        tx.set_id().unwrap();
        chain.mine_block(vec![tx]).unwrap();

        assert_eq!(find_unspent_transactions(&chain, "erin").unwrap().len(), 1);
        assert_eq!(find_utxo(&chain, "erin").unwrap().len(), 2);
        assert_eq!(get_balance(&chain, "erin").unwrap(), 3);
    }
}
