use crate::core::{Block, Blockchain, OutPoint, Trade, TradeOut};
use crate::error::{LedgerError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::hash_pub_key;
use data_encoding::HEXLOWER;
use log::{debug, info, warn};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree,
};
use std::collections::{HashMap, HashSet};

pub(crate) const UTXO_TREE: &str = "chainstate";

/// An unspent output as kept in the chainstate tree, keyed by trade id.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct IndexedOutput {
    pub index: usize,
    pub output: TradeOut,
}

/// Unspent-output queries over a ledger.
///
/// The `find_*` methods and `balance` walk the chain from tip to genesis and
/// are the source of truth. The `indexed_*` methods read the chainstate tree,
/// which `add_block` keeps in step with the chain and `reindex` rebuilds.
pub struct UTXOSet {
    blockchain: Blockchain,
}

impl UTXOSet {
    pub fn new(blockchain: Blockchain) -> UTXOSet {
        UTXOSet { blockchain }
    }

    pub fn get_blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Trades with at least one output owned by `pub_key` that no later trade
    /// signed by `pub_key` spends, paired with those output indices. Newest first.
    fn scan(&self, pub_key: &[u8]) -> Result<Vec<(Trade, Vec<usize>)>> {
        let pub_key_hash = hash_pub_key(pub_key);
        let mut spent: HashMap<Vec<u8>, HashSet<usize>> = HashMap::new();
        let mut unspent = vec![];

        for block in self.blockchain.iterator()? {
            let block = block?;
            for trade in block.get_trades().iter().rev() {
                let spent_here = spent.get(trade.get_id());
                let indices: Vec<usize> = trade
                    .get_outputs()
                    .iter()
                    .enumerate()
                    .filter(|(idx, out)| {
                        out.is_locked_with_key(&pub_key_hash)
                            && !spent_here.is_some_and(|s| s.contains(idx))
                    })
                    .map(|(idx, _)| idx)
                    .collect();
                if !indices.is_empty() {
                    unspent.push((trade.clone(), indices));
                }

                if trade.is_coinbase() {
                    continue;
                }
                for input in trade.get_inputs() {
                    if !input.is_signed_by(pub_key) {
                        continue;
                    }
                    if let Some(outpoint) = input.outpoint() {
                        spent
                            .entry(outpoint.trade_id)
                            .or_default()
                            .insert(outpoint.index);
                    }
                }
            }
        }
        Ok(unspent)
    }

    pub fn find_unspent_trades(&self, pub_key: &[u8]) -> Result<Vec<Trade>> {
        Ok(self.scan(pub_key)?.into_iter().map(|(trade, _)| trade).collect())
    }

    /// Total of every unspent output owned by `pub_key`, with the owned
    /// output indices grouped by hex trade id.
    pub fn find_utxos(&self, pub_key: &[u8]) -> Result<(u64, HashMap<String, Vec<usize>>)> {
        let mut total = 0u64;
        let mut outputs = HashMap::new();

        for (trade, indices) in self.scan(pub_key)? {
            for idx in &indices {
                total = total.saturating_add(trade.get_outputs()[*idx].get_amount());
            }
            outputs.insert(trade.hex_id(), indices);
        }
        Ok((total, outputs))
    }

    /// Owned unspent outputs keyed by outpoint, for spend checks.
    pub fn unspent_outputs(&self, pub_key: &[u8]) -> Result<HashMap<OutPoint, TradeOut>> {
        let mut outputs = HashMap::new();
        for (trade, indices) in self.scan(pub_key)? {
            for idx in indices {
                outputs.insert(
                    OutPoint {
                        trade_id: trade.get_id().to_vec(),
                        index: idx,
                    },
                    trade.get_outputs()[idx].clone(),
                );
            }
        }
        Ok(outputs)
    }

    /// Picks owned unspent outputs newest first, one output at a time, until
    /// their sum reaches `amount`. Returns the sum and the chosen outpoints;
    /// the sum is below `amount` when the owner cannot cover it.
    pub fn find_spendable_outputs(&self, pub_key: &[u8], amount: u64) -> Result<(u64, Vec<OutPoint>)> {
        let mut accumulated = 0u64;
        let mut chosen = vec![];

        'scan: for (trade, indices) in self.scan(pub_key)? {
            for idx in indices {
                if accumulated >= amount {
                    break 'scan;
                }
                accumulated = accumulated.saturating_add(trade.get_outputs()[idx].get_amount());
                chosen.push(OutPoint {
                    trade_id: trade.get_id().to_vec(),
                    index: idx,
                });
            }
        }
        debug!(
            "Selected {} outputs worth {accumulated} for a spend of {amount}",
            chosen.len()
        );
        Ok((accumulated, chosen))
    }

    pub fn balance(&self, pub_key: &[u8]) -> Result<u64> {
        Ok(self.find_utxos(pub_key)?.0)
    }

    fn state_tree(&self) -> Result<sled::Tree> {
        self.blockchain
            .get_db()
            .open_tree(UTXO_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open UTXO tree: {e}")))
    }

    /// Rebuilds the chainstate tree from the chain. Returns the number of
    /// trades that still have unspent outputs.
    pub fn reindex(&self) -> Result<usize> {
        let mut spent: HashSet<OutPoint> = HashSet::new();
        let mut unspent: HashMap<Vec<u8>, Vec<IndexedOutput>> = HashMap::new();

        for block in self.blockchain.iterator()? {
            let block = block?;
            for trade in block.get_trades().iter().rev() {
                let outs: Vec<IndexedOutput> = trade
                    .get_outputs()
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| {
                        !spent.contains(&OutPoint {
                            trade_id: trade.get_id().to_vec(),
                            index: *idx,
                        })
                    })
                    .map(|(index, output)| IndexedOutput {
                        index,
                        output: output.clone(),
                    })
                    .collect();
                if !outs.is_empty() {
                    unspent.insert(trade.get_id().to_vec(), outs);
                }

                if !trade.is_coinbase() {
                    spent.extend(trade.get_inputs().iter().filter_map(|i| i.outpoint()));
                }
            }
        }

        let utxo_tree = self.state_tree()?;
        utxo_tree.clear()?;
        for (trade_id, outs) in &unspent {
            utxo_tree.insert(trade_id.as_slice(), serialize(outs)?)?;
        }
        utxo_tree.flush()?;

        info!("Rebuilt UTXO index with {} trades", unspent.len());
        Ok(unspent.len())
    }

    fn indexed_entries(&self) -> Result<Vec<(Vec<u8>, Vec<IndexedOutput>)>> {
        let mut entries = vec![];
        for item in self.state_tree()?.iter() {
            let (k, v) = item?;
            entries.push((k.to_vec(), deserialize::<Vec<IndexedOutput>>(v.as_ref())?));
        }
        Ok(entries)
    }

    /// Indexed unspent outputs locked to `pub_key_hash`, ordered by outpoint.
    pub fn indexed_outputs(&self, pub_key_hash: &[u8]) -> Result<Vec<(OutPoint, TradeOut)>> {
        let mut outputs = vec![];
        for (trade_id, outs) in self.indexed_entries()? {
            for entry in outs {
                if entry.output.is_locked_with_key(pub_key_hash) {
                    outputs.push((
                        OutPoint {
                            trade_id: trade_id.clone(),
                            index: entry.index,
                        },
                        entry.output,
                    ));
                }
            }
        }
        outputs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(outputs)
    }

    pub fn indexed_balance(&self, pub_key_hash: &[u8]) -> Result<u64> {
        Ok(self
            .indexed_outputs(pub_key_hash)?
            .iter()
            .fold(0u64, |sum, (_, out)| sum.saturating_add(out.get_amount())))
    }

    /// Number of trades with unspent outputs in the index.
    pub fn count_trades(&self) -> Result<usize> {
        let mut counter = 0;
        for item in self.state_tree()?.iter() {
            item?;
            counter += 1;
        }
        Ok(counter)
    }
}

/// Applies `block` to the chainstate tree inside the transaction that stores it.
pub(crate) fn index_block(
    utxo_tree: &TransactionalTree,
    block: &Block,
) -> ConflictableTransactionResult<(), LedgerError> {
    for trade in block.get_trades() {
        if !trade.is_coinbase() {
            for input in trade.get_inputs() {
                let Some(outpoint) = input.outpoint() else {
                    continue;
                };
                let Some(bytes) = utxo_tree.get(&outpoint.trade_id)? else {
                    warn!(
                        "UTXO index has no entry for {}, reindex to repair",
                        HEXLOWER.encode(&outpoint.trade_id)
                    );
                    continue;
                };
                let mut outs: Vec<IndexedOutput> =
                    deserialize(bytes.as_ref()).map_err(ConflictableTransactionError::Abort)?;
                outs.retain(|entry| entry.index != outpoint.index);

                if outs.is_empty() {
                    utxo_tree.remove(outpoint.trade_id.as_slice())?;
                } else {
                    let value = serialize(&outs).map_err(ConflictableTransactionError::Abort)?;
                    utxo_tree.insert(outpoint.trade_id.as_slice(), value)?;
                }
            }
        }

        let new_outputs: Vec<IndexedOutput> = trade
            .get_outputs()
            .iter()
            .enumerate()
            .map(|(index, output)| IndexedOutput {
                index,
                output: output.clone(),
            })
            .collect();
        let value = serialize(&new_outputs).map_err(ConflictableTransactionError::Abort)?;
        utxo_tree.insert(trade.get_id(), value)?;
    }
    Ok(())
}
