// Turns the trade pool into a block. The whole batch is validated against the
// current unspent set first; any bad trade drops the batch. A valid batch is
// mined on top of the tip, re-checked and appended.

use crate::core::{Block, Blockchain, OutPoint, ProofOfWork, Trade, TradeOut};
use crate::error::Result;
use crate::storage::{TradePool, UTXOSet};
use log::{info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Why a pooled batch was refused. Each variant names the first offending trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Two trades in the batch spend the same output.
    DoubleSpend { trade_id: String, outpoint: String },
    /// An input names an output that is spent, missing or owned by someone else.
    UnspendableInput { trade_id: String, outpoint: String },
    /// Inputs and outputs do not carry the same total.
    AmountMismatch {
        trade_id: String,
        inputs: u64,
        outputs: u64,
    },
    InvalidSignature { trade_id: String },
    /// Only the genesis trade may issue value.
    UnexpectedCoinbase { trade_id: String },
}

impl RejectReason {
    pub fn trade_id(&self) -> &str {
        match self {
            RejectReason::DoubleSpend { trade_id, .. }
            | RejectReason::UnspendableInput { trade_id, .. }
            | RejectReason::AmountMismatch { trade_id, .. }
            | RejectReason::InvalidSignature { trade_id }
            | RejectReason::UnexpectedCoinbase { trade_id } => trade_id,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::DoubleSpend { trade_id, outpoint } => {
                write!(f, "trade {trade_id} double-spends {outpoint}")
            }
            RejectReason::UnspendableInput { trade_id, outpoint } => {
                write!(f, "trade {trade_id} spends unavailable output {outpoint}")
            }
            RejectReason::AmountMismatch {
                trade_id,
                inputs,
                outputs,
            } => write!(
                f,
                "trade {trade_id} spends {inputs} but creates outputs worth {outputs}"
            ),
            RejectReason::InvalidSignature { trade_id } => {
                write!(f, "trade {trade_id} has an invalid signature")
            }
            RejectReason::UnexpectedCoinbase { trade_id } => {
                write!(f, "trade {trade_id} issues new value")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// The block was appended and the pool cleared.
    Mined(Block),
    /// The batch was invalid; the pool was dropped and no block was made.
    Rejected(RejectReason),
    /// The sealed block failed its own proof-of-work check; the pool is kept.
    ProofRejected,
}

impl Blockchain {
    /// Mines the pool stored under the configured data directory.
    pub fn mine(&self) -> Result<MineOutcome> {
        let mut pool = TradePool::load(self.get_config().trade_pool_path())?;
        self.mine_pool(&mut pool)
    }

    pub fn mine_pool(&self, pool: &mut TradePool) -> Result<MineOutcome> {
        self.mine_batch(pool, |pow, block| {
            let nonce = pow.find_nonce(block)?;
            block.seal(nonce);
            Ok(())
        })
    }

    fn mine_batch<F>(&self, pool: &mut TradePool, seal: F) -> Result<MineOutcome>
    where
        F: FnOnce(&ProofOfWork, &mut Block) -> Result<()>,
    {
        let trades = pool.get_trades().to_vec();
        if let Some(reason) = self.validate_batch(&trades)? {
            warn!("Dropping {} pending trades: {reason}", trades.len());
            pool.remove()?;
            return Ok(MineOutcome::Rejected(reason));
        }

        let mut block =
            Block::new_candidate(&self.tip_hash(), trades, self.get_pow().target_bytes())?;
        info!(
            "Mining block with {} trades (difficulty: {})",
            block.get_trades().len(),
            self.get_pow().get_difficulty()
        );
        seal(self.get_pow(), &mut block)?;

        if !ProofOfWork::validate(&block) {
            warn!(
                "Mined block {} failed proof-of-work validation, keeping pool",
                block.hex_hash()
            );
            return Ok(MineOutcome::ProofRejected);
        }

        self.add_block(&block)?;
        pool.remove()?;
        info!("Mined block {}", block.hex_hash());
        Ok(MineOutcome::Mined(block))
    }

    /// First reason the batch cannot be mined, if any.
    fn validate_batch(&self, trades: &[Trade]) -> Result<Option<RejectReason>> {
        let utxo_set = UTXOSet::new(self.clone());
        let mut spent_in_batch: HashSet<OutPoint> = HashSet::new();
        let mut unspent_by_signer: HashMap<Vec<u8>, HashMap<OutPoint, TradeOut>> = HashMap::new();

        for trade in trades {
            let trade_id = trade.hex_id();
            if trade.is_coinbase() {
                return Ok(Some(RejectReason::UnexpectedCoinbase { trade_id }));
            }

            let mut input_total = 0u64;
            for input in trade.get_inputs() {
                let Some(outpoint) = input.outpoint() else {
                    return Ok(Some(RejectReason::UnspendableInput {
                        trade_id,
                        outpoint: input.get_out_index().to_string(),
                    }));
                };
                if !spent_in_batch.insert(outpoint.clone()) {
                    return Ok(Some(RejectReason::DoubleSpend {
                        trade_id,
                        outpoint: outpoint.to_string(),
                    }));
                }

                let signer = input.get_pub_key();
                if !unspent_by_signer.contains_key(signer) {
                    let owned = utxo_set.unspent_outputs(signer)?;
                    unspent_by_signer.insert(signer.to_vec(), owned);
                }
                let amount = unspent_by_signer
                    .get(signer)
                    .and_then(|owned| owned.get(&outpoint))
                    .map(TradeOut::get_amount);
                match amount.and_then(|a| input_total.checked_add(a)) {
                    Some(total) => input_total = total,
                    None => {
                        return Ok(Some(RejectReason::UnspendableInput {
                            trade_id,
                            outpoint: outpoint.to_string(),
                        }))
                    }
                }
            }

            let output_total = trade.output_total();
            if output_total != Some(input_total) {
                return Ok(Some(RejectReason::AmountMismatch {
                    trade_id,
                    inputs: input_total,
                    outputs: output_total.unwrap_or(u64::MAX),
                }));
            }

            if !trade.verify() {
                return Ok(Some(RejectReason::InvalidSignature { trade_id }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TradeIn;
    use crate::testnet::{create_test_blockchain, pool_for};
    use crate::wallet::Wallet;

    #[test]
    fn test_empty_pool_mines_empty_block() {
        let (blockchain, _owner, dir) = create_test_blockchain().unwrap();
        let mut pool = pool_for(&dir);

        let outcome = blockchain.mine_pool(&mut pool).unwrap();
        let MineOutcome::Mined(block) = outcome else {
            panic!("expected a mined block, got {outcome:?}");
        };
        assert!(block.get_trades().is_empty());
        assert_eq!(blockchain.block_count().unwrap(), 2);
    }

    #[test]
    fn test_valid_batch_is_mined_and_pool_cleared() {
        let (blockchain, owner, dir) = create_test_blockchain().unwrap();
        let recipient = Wallet::new().unwrap();
        let trade = blockchain
            .create_trade(&owner, &recipient.get_pub_key_hash(), 200, "rent")
            .unwrap();

        let mut pool = pool_for(&dir);
        pool.add_trade(trade.clone());
        pool.save().unwrap();

        let outcome = blockchain.mine_pool(&mut pool).unwrap();
        let MineOutcome::Mined(block) = outcome else {
            panic!("expected a mined block, got {outcome:?}");
        };
        assert_eq!(block.get_trades(), std::slice::from_ref(&trade));
        assert!(pool.is_empty());
        assert!(!pool.get_path().exists());
    }

    #[test]
    fn test_proof_failure_keeps_pool() {
        let (blockchain, owner, dir) = create_test_blockchain().unwrap();
        let recipient = Wallet::new().unwrap();
        let trade = blockchain
            .create_trade(&owner, &recipient.get_pub_key_hash(), 10, "")
            .unwrap();

        let mut pool = pool_for(&dir);
        pool.add_trade(trade);
        pool.save().unwrap();

        // Seal with the first nonce after the valid one that misses the target
        let outcome = blockchain
            .mine_batch(&mut pool, |pow, block| {
                let mut nonce = pow.find_nonce(block)? + 1;
                loop {
                    block.seal(nonce);
                    if !ProofOfWork::validate(block) {
                        return Ok(());
                    }
                    nonce += 1;
                }
            })
            .unwrap();

        assert_eq!(outcome, MineOutcome::ProofRejected);
        assert_eq!(pool.len(), 1);
        assert!(pool.get_path().exists());
        assert_eq!(blockchain.block_count().unwrap(), 1);
    }

    #[test]
    fn test_coinbase_in_pool_is_rejected() {
        let (blockchain, owner, dir) = create_test_blockchain().unwrap();
        let minted = Trade::first_trade(&owner.get_pub_key_hash(), 50).unwrap();

        let mut pool = pool_for(&dir);
        pool.add_trade(minted.clone());

        let outcome = blockchain.mine_pool(&mut pool).unwrap();
        assert_eq!(
            outcome,
            MineOutcome::Rejected(RejectReason::UnexpectedCoinbase {
                trade_id: minted.hex_id()
            })
        );
        assert!(pool.is_empty());
        assert_eq!(blockchain.block_count().unwrap(), 1);
    }

    #[test]
    fn test_spending_someone_elses_output_is_rejected() {
        let (blockchain, owner, dir) = create_test_blockchain().unwrap();
        let thief = Wallet::new().unwrap();
        let genesis = blockchain.get_block(&blockchain.tip_hash()).unwrap().unwrap();
        let genesis_trade = &genesis.get_trades()[0];

        // Thief claims the owner's genesis output with its own key
        let input = TradeIn::new(genesis_trade.get_id(), 0, thief.get_public_key()).unwrap();
        let output = TradeOut::new(
            blockchain.get_config().initial_issuance,
            &thief.get_pub_key_hash(),
        );
        let mut trade = Trade::new(vec![input], vec![output], "").unwrap();
        trade.sign(&thief).unwrap();

        let mut pool = pool_for(&dir);
        pool.add_trade(trade);
        let outcome = blockchain.mine_pool(&mut pool).unwrap();
        assert!(matches!(
            outcome,
            MineOutcome::Rejected(RejectReason::UnspendableInput { .. })
        ));

        let utxo_set = UTXOSet::new(blockchain.clone());
        assert_eq!(
            utxo_set.balance(owner.get_public_key()).unwrap(),
            blockchain.get_config().initial_issuance
        );
    }

    #[test]
    fn test_unbalanced_trade_is_rejected() {
        let (blockchain, owner, dir) = create_test_blockchain().unwrap();
        let genesis = blockchain.get_block(&blockchain.tip_hash()).unwrap().unwrap();
        let genesis_trade = &genesis.get_trades()[0];

        // Creates more value than it spends
        let input = TradeIn::new(genesis_trade.get_id(), 0, owner.get_public_key()).unwrap();
        let output = TradeOut::new(5000, &owner.get_pub_key_hash());
        let mut trade = Trade::new(vec![input], vec![output], "").unwrap();
        trade.sign(&owner).unwrap();

        let mut pool = pool_for(&dir);
        pool.add_trade(trade.clone());
        let outcome = blockchain.mine_pool(&mut pool).unwrap();
        assert_eq!(
            outcome,
            MineOutcome::Rejected(RejectReason::AmountMismatch {
                trade_id: trade.hex_id(),
                inputs: 1000,
                outputs: 5000,
            })
        );
    }

    #[test]
    fn test_reject_reason_names_trade() {
        let reason = RejectReason::InvalidSignature {
            trade_id: "abcd".to_string(),
        };
        assert_eq!(reason.trade_id(), "abcd");
        assert!(reason.to_string().contains("abcd"));
    }
}
