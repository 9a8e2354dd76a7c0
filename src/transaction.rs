//! Transaction construction and content addressing

use tracing::debug;

use crate::chain::Blockchain;
use crate::constants::*;
use crate::encoding::{encode_transaction, sha256};
use crate::error::{LedgerError, Result};
use crate::ownership::{PlainTextOwnership, Signer, Verifier};
use crate::types::*;
use crate::utxo;

impl Transaction {
    /// Id of this transaction: hash of its encoding with `id` held empty
    pub fn compute_id(&self) -> Result<Hash> {
        let unsigned = Transaction {
            id: Vec::new(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        };
        Ok(sha256(&encode_transaction(&unsigned)?))
    }

    pub fn set_id(&mut self) -> Result<()> {
        self.id = self.compute_id()?.to_vec();
        Ok(())
    }

    pub fn has_valid_id(&self) -> Result<bool> {
        Ok(self.id.as_slice() == self.compute_id()?.as_slice())
    }

    /// Exactly one input, with an empty txid and output index -1
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].txid.is_empty()
            && self.inputs[0].output_index == COINBASE_OUTPUT_INDEX
    }
}

impl TxInput {
    /// Whether this input spends an output locked to `address`
    pub fn can_unlock_output_with(&self, address: &str, verifier: &impl Verifier) -> bool {
        verifier.verify(address, &self.unlock_data)
    }
}

impl TxOutput {
    /// Whether `proof` opens this output
    pub fn can_be_unlocked_with(&self, proof: &str, verifier: &impl Verifier) -> bool {
        verifier.verify(&self.lock_data, proof)
    }
}

/// NewCoinbaseTx: mints `SUBSIDY` to `to`.
///
/// An empty `data` is replaced by `Reward to '<to>'`.
pub fn new_coinbase_tx(to: &str, data: &str) -> Result<Transaction> {
    let data = if data.is_empty() {
        format!("Reward to '{}'", to)
    } else {
        data.to_string()
    };

    let mut tx = Transaction {
        id: Vec::new(),
        inputs: vec![TxInput {
            txid: Vec::new(),
            output_index: COINBASE_OUTPUT_INDEX,
            unlock_data: data,
        }],
        outputs: vec![TxOutput {
            value: SUBSIDY,
            lock_data: to.to_string(),
        }],
    };
    tx.set_id()?;

    Ok(tx)
}

/// NewSpendTx with the plain-text ownership scheme
pub fn new_spend_tx(from: &str, to: &str, amount: u64, chain: &Blockchain) -> Result<Transaction> {
    new_spend_tx_with(from, to, amount, chain, &PlainTextOwnership)
}

/// NewSpendTx: moves `amount` from `from` to `to`.
///
/// 1. Select unspent outputs of `from` until they cover `amount`
/// 2. Fail with `InsufficientFunds` if they cannot
/// 3. One input per selected output, proved by `ownership`
/// 4. One output of `amount` to `to`, plus change to `from` if any
pub fn new_spend_tx_with<O: Signer + Verifier>(
    from: &str,
    to: &str,
    amount: u64,
    chain: &Blockchain,
    ownership: &O,
) -> Result<Transaction> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount("amount must be positive".to_string()));
    }

    let (accumulated, spendable) = utxo::find_spendable_outputs_with(chain, from, amount, ownership)?;
    if accumulated < amount {
        return Err(LedgerError::InsufficientFunds {
            address: from.to_string(),
            available: accumulated,
            requested: amount,
        });
    }

    let proof = ownership.prove(from);
    let inputs: Vec<TxInput> = spendable
        .into_iter()
        .flat_map(|(txid, indices)| {
            let proof = proof.clone();
            indices.into_iter().map(move |output_index| TxInput {
                txid: txid.clone(),
                output_index,
                unlock_data: proof.clone(),
            })
        })
        .collect();

    let mut outputs = vec![TxOutput {
        value: amount,
        lock_data: to.to_string(),
    }];
    if accumulated > amount {
        outputs.push(TxOutput {
            value: accumulated - amount,
            lock_data: from.to_string(),
        });
    }

    debug!(from, to, amount, inputs = inputs.len(), change = accumulated - amount, "Built spend transaction");

    let mut tx = Transaction {
        id: Vec::new(),
        inputs,
        outputs,
    };
    tx.set_id()?;

    Ok(tx)
}
