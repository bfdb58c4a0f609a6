//! Test utilities for ledger testing

use crate::config::Config;
use crate::core::{Block, Blockchain, MineOutcome};
use crate::error::{LedgerError, Result};
use crate::storage::TradePool;
use crate::wallet::Wallet;
use std::path::Path;
use tempfile::TempDir;

/// Difficulty used by tests; low enough that a block mines in milliseconds.
pub const TEST_DIFFICULTY: u32 = 8;

/// Settings rooted at `dir` with the test difficulty.
pub fn test_config(dir: &Path) -> Config {
    Config::with_data_dir(dir, TEST_DIFFICULTY)
}

/// Fresh ledger in a temporary directory, with a genesis owner wallet.
pub fn create_test_blockchain() -> Result<(Blockchain, Wallet, TempDir)> {
    let temp_dir = tempfile::tempdir()?;
    let owner = Wallet::new()?;
    let blockchain =
        Blockchain::init_blockchain(&test_config(temp_dir.path()), &owner.get_pub_key_hash())?;
    Ok((blockchain, owner, temp_dir))
}

/// Empty pool at the configured location inside `dir`.
pub fn pool_for(dir: &TempDir) -> TradePool {
    TradePool::load(test_config(dir.path()).trade_pool_path()).expect("fresh pool loads")
}

/// Sends `amount` from `from` to `to` and mines it in its own block.
pub fn mine_transfer(blockchain: &Blockchain, from: &Wallet, to: &Wallet, amount: u64) -> Result<Block> {
    let trade = blockchain.create_trade(from, &to.get_pub_key_hash(), amount, "test transfer")?;
    let mut pool = TradePool::load(blockchain.get_config().trade_pool_path())?;
    pool.add_trade(trade);
    match blockchain.mine_pool(&mut pool)? {
        MineOutcome::Mined(block) => Ok(block),
        other => Err(LedgerError::InvalidBlock(format!(
            "test transfer was not mined: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UTXOSet;

    #[test]
    fn test_create_test_blockchain() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        assert_eq!(blockchain.block_count().unwrap(), 1);
        assert_eq!(blockchain.get_pow().get_difficulty(), TEST_DIFFICULTY);
    }

    #[test]
    fn test_mine_transfer_moves_value() {
        let (blockchain, owner, _dir) = create_test_blockchain().unwrap();
        let recipient = Wallet::new().unwrap();
        mine_transfer(&blockchain, &owner, &recipient, 5).unwrap();

        let utxo_set = UTXOSet::new(blockchain.clone());
        assert_eq!(utxo_set.balance(recipient.get_public_key()).unwrap(), 5);
        assert_eq!(blockchain.block_count().unwrap(), 2);
    }
}
