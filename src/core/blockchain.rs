// The ledger: one linear chain of blocks stored in sled, keyed by block hash.
// Three well-known keys sit next to the blocks: the tip hash, the genesis
// anchor (the placeholder previous hash of the first block that ends every
// backward walk) and the proof-of-work target fixed when the chain was
// created. Writes go through one sled transaction that checks linkage
// against the persisted tip, stores the block, moves the tip and updates the
// unspent-output index together.

use crate::config::Config;
use crate::core::{Block, ProofOfWork, Trade, TradeIn, TradeOut, FIRST_TRADE_DESCRIPTION};
use crate::error::{LedgerError, Result};
use crate::storage::utxo_set::{index_block, UTXO_TREE};
use crate::storage::UTXOSet;
use crate::wallet::{hash_pub_key, TradeSigner};
use data_encoding::HEXLOWER;
use log::{error, info, warn};
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

const TIP_BLOCK_HASH_KEY: &str = "lh";
const GENESIS_ANCHOR_KEY: &str = "ogprevhash";
const TARGET_KEY: &str = "target";
const BLOCKS_TREE: &str = "blocks";

/// Previous hash of the first block.
pub const GENESIS_ANCHOR: &[u8] = b"I have no prevHash...";

#[derive(Debug, Clone)]
pub struct Blockchain {
    tip_hash: Arc<RwLock<Vec<u8>>>,
    genesis_anchor: Vec<u8>,
    db: Db,
    config: Config,
    pow: ProofOfWork,
}

fn map_transaction_error(err: TransactionError<LedgerError>) -> LedgerError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => LedgerError::Database(e.to_string()),
    }
}

impl Blockchain {
    /// Creates the chain with a genesis trade paying the configured issuance to
    /// `owner_pub_key_hash`. Over an existing store this only reopens the chain;
    /// an existing genesis is never replaced.
    pub fn init_blockchain(config: &Config, owner_pub_key_hash: &[u8]) -> Result<Blockchain> {
        config.validate()?;
        let db = Self::open_db(config)?;
        let blocks_tree = db.open_tree(BLOCKS_TREE)?;

        if blocks_tree.get(TIP_BLOCK_HASH_KEY)?.is_some() {
            warn!("Blockchain already exists, continuing it instead of creating a new one");
            return Self::from_db(db, config);
        }

        let pow = ProofOfWork::new(config.difficulty)?;
        let first_trade = Trade::first_trade(owner_pub_key_hash, config.initial_issuance)?;
        let genesis = Block::new_block(GENESIS_ANCHOR, vec![first_trade], &pow)?;
        let block_data = genesis.serialize()?;
        let state_tree = db.open_tree(UTXO_TREE)?;

        (&blocks_tree, &state_tree)
            .transaction(|(tx_blocks, tx_state)| {
                if tx_blocks.get(TIP_BLOCK_HASH_KEY)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(LedgerError::Database(
                        "Blockchain was created concurrently".to_string(),
                    )));
                }
                tx_blocks.insert(genesis.get_hash(), block_data.as_slice())?;
                tx_blocks.insert(TIP_BLOCK_HASH_KEY, genesis.get_hash())?;
                tx_blocks.insert(GENESIS_ANCHOR_KEY, GENESIS_ANCHOR)?;
                tx_blocks.insert(TARGET_KEY, pow.target_bytes())?;
                index_block(tx_state, &genesis)?;
                Ok(())
            })
            .map_err(map_transaction_error)?;
        db.flush()?;

        info!(
            "Genesis block {} created, {} units issued",
            genesis.hex_hash(),
            config.initial_issuance
        );

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(genesis.get_hash().to_vec())),
            genesis_anchor: GENESIS_ANCHOR.to_vec(),
            db,
            config: config.clone(),
            pow,
        })
    }

    /// Opens an existing chain; fails with `ChainNotFound` when there is none.
    pub fn continue_blockchain(config: &Config) -> Result<Blockchain> {
        config.validate()?;
        if !config.blocks_path().exists() {
            return Err(LedgerError::ChainNotFound);
        }
        let db = Self::open_db(config)?;
        Self::from_db(db, config)
    }

    fn open_db(config: &Config) -> Result<Db> {
        sled::open(config.blocks_path())
            .map_err(|e| LedgerError::Database(format!("Failed to open database: {e}")))
    }

    fn from_db(db: Db, config: &Config) -> Result<Blockchain> {
        let blocks_tree = db.open_tree(BLOCKS_TREE)?;
        let tip_hash = blocks_tree
            .get(TIP_BLOCK_HASH_KEY)?
            .ok_or(LedgerError::ChainNotFound)?;
        let genesis_anchor = blocks_tree.get(GENESIS_ANCHOR_KEY)?.ok_or_else(|| {
            LedgerError::CorruptChain("genesis anchor is missing".to_string())
        })?;
        let chain_target = blocks_tree
            .get(TARGET_KEY)?
            .ok_or_else(|| LedgerError::CorruptChain("chain target is missing".to_string()))?;

        // The difficulty is fixed for the life of the chain
        let pow = ProofOfWork::new(config.difficulty)?;
        if chain_target.as_ref() != pow.target_bytes().as_slice() {
            return Err(LedgerError::Config(format!(
                "difficulty {} does not match the target this chain was created with ({})",
                config.difficulty,
                HEXLOWER.encode(chain_target.as_ref())
            )));
        }

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash.to_vec())),
            genesis_anchor: genesis_anchor.to_vec(),
            db,
            config: config.clone(),
            pow,
        })
    }

    fn blocks_tree(&self) -> Result<Tree> {
        self.db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))
    }

    pub fn get_db(&self) -> &Db {
        &self.db
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn tip_hash(&self) -> Vec<u8> {
        self.tip_hash
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_tip_hash(&self, new_tip_hash: &[u8]) {
        let mut tip_hash = self
            .tip_hash
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *tip_hash = new_tip_hash.to_vec();
    }

    pub fn genesis_anchor(&self) -> &[u8] {
        self.genesis_anchor.as_slice()
    }

    /// Appends `block` if it is sealed correctly and extends the persisted tip.
    pub fn add_block(&self, block: &Block) -> Result<()> {
        if block.get_target() != self.pow.target_bytes().as_slice() {
            return Err(LedgerError::InvalidBlock(format!(
                "block {} uses a different target",
                block.hex_hash()
            )));
        }
        if !block.has_consistent_hash() {
            return Err(LedgerError::InvalidBlock(format!(
                "block {} does not hash to its stored hash",
                block.hex_hash()
            )));
        }
        if !ProofOfWork::validate(block) {
            return Err(LedgerError::InvalidBlock(format!(
                "block {} has an invalid nonce",
                block.hex_hash()
            )));
        }

        let block_data = block.serialize()?;
        let blocks_tree = self.blocks_tree()?;
        let state_tree = self.db.open_tree(UTXO_TREE)?;

        let result = (&blocks_tree, &state_tree).transaction(|(tx_blocks, tx_state)| {
            let tip = tx_blocks.get(TIP_BLOCK_HASH_KEY)?.ok_or_else(|| {
                ConflictableTransactionError::Abort(LedgerError::ChainNotFound)
            })?;
            if tip.as_ref() != block.get_prev_hash() {
                return Err(ConflictableTransactionError::Abort(
                    LedgerError::ChainLinkage {
                        expected: HEXLOWER.encode(tip.as_ref()),
                        found: HEXLOWER.encode(block.get_prev_hash()),
                    },
                ));
            }
            tx_blocks.insert(block.get_hash(), block_data.as_slice())?;
            tx_blocks.insert(TIP_BLOCK_HASH_KEY, block.get_hash())?;
            index_block(tx_state, block)?;
            Ok(())
        });

        if let Err(e) = result {
            let e = map_transaction_error(e);
            if e.is_fatal() {
                error!("Refusing block {}: {e}", block.hex_hash());
            }
            return Err(e);
        }
        self.db.flush()?;
        self.set_tip_hash(block.get_hash());

        info!(
            "Block {} appended with {} trades",
            block.hex_hash(),
            block.get_trades().len()
        );
        Ok(())
    }

    pub fn iterator(&self) -> Result<BlockchainIterator> {
        Ok(BlockchainIterator {
            tree: self.blocks_tree()?,
            current_hash: self.tip_hash(),
            genesis_anchor: self.genesis_anchor.clone(),
        })
    }

    pub fn get_block(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        match self.blocks_tree()?.get(block_hash)? {
            Some(bytes) => Ok(Some(Block::deserialize(bytes.as_ref())?)),
            None => Ok(None),
        }
    }

    pub fn find_trade(&self, trade_id: &[u8]) -> Result<Option<Trade>> {
        for block in self.iterator()? {
            let block = block?;
            if let Some(trade) = block.get_trades().iter().find(|t| t.get_id() == trade_id) {
                return Ok(Some(trade.clone()));
            }
        }
        Ok(None)
    }

    pub fn block_count(&self) -> Result<usize> {
        let mut count = 0;
        for block in self.iterator()? {
            block?;
            count += 1;
        }
        Ok(count)
    }

    /// Re-checks every committed block from tip to genesis: chain target,
    /// stored hash, proof of work, linkage and trade signatures. Returns the
    /// block count.
    pub fn verify_chain(&self) -> Result<usize> {
        let mut expected = self.tip_hash();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let chain_target = self.pow.target_bytes();

        for block in self.iterator()? {
            let block = block?;
            let hash_hex = block.hex_hash();
            if block.get_hash() != expected.as_slice() {
                return Err(LedgerError::CorruptChain(format!(
                    "block stored under {} carries hash {hash_hex}",
                    HEXLOWER.encode(&expected)
                )));
            }
            if !seen.insert(block.get_hash().to_vec()) {
                return Err(LedgerError::CorruptChain(format!(
                    "block {hash_hex} visited twice"
                )));
            }
            if block.get_target() != chain_target.as_slice() {
                return Err(LedgerError::CorruptChain(format!(
                    "block {hash_hex} uses target {} instead of the chain target",
                    HEXLOWER.encode(block.get_target())
                )));
            }
            if !block.has_consistent_hash() || !ProofOfWork::validate(&block) {
                return Err(LedgerError::CorruptChain(format!(
                    "block {hash_hex} fails its proof of work"
                )));
            }
            if let Some(trade) = block.get_trades().iter().find(|t| !t.verify()) {
                return Err(LedgerError::CorruptChain(format!(
                    "trade {} in block {hash_hex} fails verification",
                    trade.hex_id()
                )));
            }
            expected = block.get_prev_hash().to_vec();
        }
        Ok(seen.len())
    }

    /// Every trade where `pub_key` signs an input or receives an output, newest first.
    pub fn trace_currency(&self, pub_key: &[u8]) -> Result<Vec<Trade>> {
        let mut trades = vec![];
        let mut visited: HashSet<Vec<u8>> = HashSet::new();

        for block in self.iterator()? {
            let block = block?;
            for trade in block.get_trades().iter().rev() {
                if trade.involves(pub_key) && visited.insert(trade.get_id().to_vec()) {
                    trades.push(trade.clone());
                }
            }
        }
        Ok(trades)
    }

    /// Follows a trade back to the genesis issuance through the source of its
    /// first input. The result starts with `trade_id` and ends with the
    /// genesis trade.
    pub fn trace_provenance(&self, trade_id: &[u8]) -> Result<Vec<Trade>> {
        let mut trades_by_id: HashMap<Vec<u8>, Trade> = HashMap::new();
        for block in self.iterator()? {
            for trade in block?.get_trades() {
                trades_by_id.insert(trade.get_id().to_vec(), trade.clone());
            }
        }

        let mut current = trades_by_id.get(trade_id).ok_or_else(|| {
            LedgerError::InvalidTrade(format!(
                "trade {} is not on the chain",
                HEXLOWER.encode(trade_id)
            ))
        })?;
        let mut path = vec![];
        let mut visited: HashSet<Vec<u8>> = HashSet::new();

        loop {
            if !visited.insert(current.get_id().to_vec()) {
                return Err(LedgerError::CorruptChain(format!(
                    "trade {} appears twice in its own provenance",
                    current.hex_id()
                )));
            }
            path.push(current.clone());
            if current.is_coinbase() && current.get_description() == FIRST_TRADE_DESCRIPTION {
                break;
            }

            let source_id = match current.get_inputs().first() {
                Some(input) => input.get_trade_id(),
                None => {
                    return Err(LedgerError::CorruptChain(format!(
                        "trade {} has no inputs",
                        current.hex_id()
                    )))
                }
            };
            current = match trades_by_id.get(source_id) {
                Some(source) => source,
                None => {
                    error!(
                        "Source trade {} of {} not found",
                        HEXLOWER.encode(source_id),
                        current.hex_id()
                    );
                    return Err(LedgerError::CorruptChain(format!(
                        "source trade {} is missing",
                        HEXLOWER.encode(source_id)
                    )));
                }
            };
        }

        info!(
            "Trade {} traced back {} hops to genesis",
            HEXLOWER.encode(trade_id),
            path.len() - 1
        );
        Ok(path)
    }

    /// Builds and signs a transfer of `amount` from the signer to
    /// `to_pub_key_hash`, returning change to the signer. Nothing is stored.
    pub fn create_trade<S: TradeSigner + ?Sized>(
        &self,
        signer: &S,
        to_pub_key_hash: &[u8],
        amount: u64,
        description: &str,
    ) -> Result<Trade> {
        if amount == 0 {
            return Err(LedgerError::InvalidTrade(
                "Amount must be positive".to_string(),
            ));
        }

        let from = signer.public_key();
        let utxo_set = UTXOSet::new(self.clone());
        let (accumulated, outpoints) = utxo_set.find_spendable_outputs(from, amount)?;
        if accumulated < amount {
            info!("Insufficient balance: {accumulated} available, {amount} requested");
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let inputs = outpoints
            .iter()
            .map(|outpoint| TradeIn::new(&outpoint.trade_id, outpoint.index, from))
            .collect::<Result<Vec<_>>>()?;

        let mut outputs = vec![TradeOut::new(amount, to_pub_key_hash)];
        if accumulated > amount {
            outputs.push(TradeOut::new(accumulated - amount, &hash_pub_key(from)));
        }

        let mut trade = Trade::new(inputs, outputs, description)?;
        trade.sign(signer)?;
        Ok(trade)
    }
}

/// Walks blocks from the tip back to the genesis anchor.
pub struct BlockchainIterator {
    tree: Tree,
    current_hash: Vec<u8>,
    genesis_anchor: Vec<u8>,
}

impl Iterator for BlockchainIterator {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_hash == self.genesis_anchor {
            return None;
        }

        let block = match self.tree.get(&self.current_hash) {
            Ok(Some(bytes)) => Block::deserialize(bytes.as_ref()),
            Ok(None) => Err(LedgerError::CorruptChain(format!(
                "block {} is missing",
                HEXLOWER.encode(&self.current_hash)
            ))),
            Err(e) => Err(e.into()),
        };

        match block {
            Ok(block) => {
                self.current_hash = block.get_prev_hash().to_vec();
                Some(Ok(block))
            }
            Err(e) => {
                // Stop after reporting
                self.current_hash = self.genesis_anchor.clone();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{create_test_blockchain, mine_transfer, test_config, TEST_DIFFICULTY};
    use crate::core::trade::tests::signed_trade;
    use crate::wallet::Wallet;
    use tempfile::tempdir;

    #[test]
    fn test_genesis_creation() {
        let (blockchain, owner, _dir) = create_test_blockchain().unwrap();

        assert_eq!(blockchain.block_count().unwrap(), 1);
        assert_eq!(blockchain.genesis_anchor(), GENESIS_ANCHOR);

        let genesis = blockchain.get_block(&blockchain.tip_hash()).unwrap().unwrap();
        assert_eq!(genesis.get_prev_hash(), GENESIS_ANCHOR);
        assert_eq!(genesis.get_trades().len(), 1);
        assert!(genesis.get_trades()[0].is_coinbase());
        assert!(genesis.get_trades()[0]
            .get_outputs()[0]
            .is_owned_by(owner.get_public_key()));
    }

    #[test]
    fn test_init_over_existing_chain_continues() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let owner = Wallet::new().unwrap();
        let intruder = Wallet::new().unwrap();

        let tip = {
            let blockchain = Blockchain::init_blockchain(&config, &owner.get_pub_key_hash()).unwrap();
            blockchain.tip_hash()
        };

        let reopened = Blockchain::init_blockchain(&config, &intruder.get_pub_key_hash()).unwrap();
        assert_eq!(reopened.tip_hash(), tip);
        assert_eq!(reopened.block_count().unwrap(), 1);
    }

    #[test]
    fn test_continue_without_chain_fails() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let result = Blockchain::continue_blockchain(&config);
        assert!(matches!(result, Err(LedgerError::ChainNotFound)));
    }

    #[test]
    fn test_add_block_extends_tip() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        let genesis_hash = blockchain.tip_hash();

        let block = Block::new_block(&genesis_hash, vec![], blockchain.get_pow()).unwrap();
        blockchain.add_block(&block).unwrap();

        assert_eq!(blockchain.tip_hash(), block.get_hash());
        assert_eq!(blockchain.block_count().unwrap(), 2);
        assert_eq!(blockchain.verify_chain().unwrap(), 2);
    }

    #[test]
    fn test_add_block_rejects_stale_parent() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        let genesis_hash = blockchain.tip_hash();

        let first = Block::new_block(&genesis_hash, vec![], blockchain.get_pow()).unwrap();
        let competing = Block::new_block(&genesis_hash, vec![], blockchain.get_pow()).unwrap();
        blockchain.add_block(&first).unwrap();

        let err = blockchain.add_block(&competing).unwrap_err();
        assert!(matches!(err, LedgerError::ChainLinkage { .. }));
        assert!(err.is_fatal());
        assert_eq!(blockchain.tip_hash(), first.get_hash());
        assert_eq!(blockchain.block_count().unwrap(), 2);
    }

    #[test]
    fn test_add_block_rejects_bad_seal() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        let tip = blockchain.tip_hash();

        // Wrong target
        let easier = ProofOfWork::new(1).unwrap();
        let block = Block::new_block(&tip, vec![], &easier).unwrap();
        assert!(matches!(
            blockchain.add_block(&block),
            Err(LedgerError::InvalidBlock(_))
        ));

        // Never sealed
        let candidate =
            Block::new_candidate(&tip, vec![], blockchain.get_pow().target_bytes()).unwrap();
        assert!(matches!(
            blockchain.add_block(&candidate),
            Err(LedgerError::InvalidBlock(_))
        ));
        assert_eq!(blockchain.block_count().unwrap(), 1);
    }

    #[test]
    fn test_iterator_walks_back_to_anchor() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        for _ in 0..3 {
            let block =
                Block::new_block(&blockchain.tip_hash(), vec![], blockchain.get_pow()).unwrap();
            blockchain.add_block(&block).unwrap();
        }

        let blocks: Vec<Block> = blockchain
            .iterator()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].get_hash(), blockchain.tip_hash().as_slice());
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].get_prev_hash(), pair[1].get_hash());
        }
        assert_eq!(blocks[3].get_prev_hash(), GENESIS_ANCHOR);
    }

    #[test]
    fn test_chain_survives_reopen() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let owner = Wallet::new().unwrap();

        let tip = {
            let blockchain = Blockchain::init_blockchain(&config, &owner.get_pub_key_hash()).unwrap();
            let block =
                Block::new_block(&blockchain.tip_hash(), vec![], blockchain.get_pow()).unwrap();
            blockchain.add_block(&block).unwrap();
            blockchain.tip_hash()
        };

        let blockchain = Blockchain::continue_blockchain(&config).unwrap();
        assert_eq!(blockchain.tip_hash(), tip);
        assert_eq!(blockchain.verify_chain().unwrap(), 2);
    }

    #[test]
    fn test_find_trade() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        let genesis = blockchain.get_block(&blockchain.tip_hash()).unwrap().unwrap();
        let first_trade = &genesis.get_trades()[0];

        let found = blockchain.find_trade(first_trade.get_id()).unwrap();
        assert_eq!(found.as_ref(), Some(first_trade));
        assert!(blockchain.find_trade(b"missing").unwrap().is_none());
    }

    #[test]
    fn test_reopen_with_other_difficulty_is_refused() {
        let dir = tempdir().unwrap();
        let owner = Wallet::new().unwrap();
        Blockchain::init_blockchain(&test_config(dir.path()), &owner.get_pub_key_hash()).unwrap();

        let harder = Config::with_data_dir(dir.path(), TEST_DIFFICULTY + 1);
        assert!(matches!(
            Blockchain::continue_blockchain(&harder),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            Blockchain::init_blockchain(&harder, &owner.get_pub_key_hash()),
            Err(LedgerError::Config(_))
        ));

        let blockchain = Blockchain::continue_blockchain(&test_config(dir.path())).unwrap();
        assert_eq!(blockchain.get_pow().get_difficulty(), TEST_DIFFICULTY);
    }

    #[test]
    fn test_verify_chain_rejects_foreign_target() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();

        // Written around add_block, which would refuse it
        let easier = ProofOfWork::new(1).unwrap();
        let block = Block::new_block(&blockchain.tip_hash(), vec![], &easier).unwrap();
        let tree = blockchain.blocks_tree().unwrap();
        tree.insert(block.get_hash(), block.serialize().unwrap()).unwrap();
        tree.insert(TIP_BLOCK_HASH_KEY, block.get_hash()).unwrap();
        blockchain.set_tip_hash(block.get_hash());

        assert!(matches!(
            blockchain.verify_chain(),
            Err(LedgerError::CorruptChain(_))
        ));
    }

    #[test]
    fn test_trace_provenance_reaches_genesis() {
        let (blockchain, owner, _dir) = create_test_blockchain().unwrap();
        let alice = Wallet::new().unwrap();
        let bob = Wallet::new().unwrap();
        let to_alice = mine_transfer(&blockchain, &owner, &alice, 300).unwrap();
        let to_bob = mine_transfer(&blockchain, &alice, &bob, 120).unwrap();

        let bob_trade = &to_bob.get_trades()[0];
        let path = blockchain.trace_provenance(bob_trade.get_id()).unwrap();

        assert_eq!(path.len(), 3);
        assert_eq!(&path[0], bob_trade);
        assert_eq!(&path[1], &to_alice.get_trades()[0]);
        assert!(path[2].is_coinbase());
        assert_eq!(path[2].get_description(), FIRST_TRADE_DESCRIPTION);

        // The genesis trade is its own provenance
        let genesis = blockchain.trace_provenance(path[2].get_id()).unwrap();
        assert_eq!(genesis.len(), 1);
    }

    #[test]
    fn test_trace_provenance_unknown_trade() {
        let (blockchain, _owner, _dir) = create_test_blockchain().unwrap();
        assert!(matches!(
            blockchain.trace_provenance(&[9u8; 32]),
            Err(LedgerError::InvalidTrade(_))
        ));
    }

    #[test]
    fn test_trace_provenance_missing_source() {
        let (blockchain, owner, _dir) = create_test_blockchain().unwrap();
        let recipient = Wallet::new().unwrap();

        // Spends an output of a trade that was never committed
        let orphan = signed_trade(&owner, &recipient, 30);
        let block =
            Block::new_block(&blockchain.tip_hash(), vec![orphan.clone()], blockchain.get_pow())
                .unwrap();
        blockchain.add_block(&block).unwrap();

        assert!(matches!(
            blockchain.trace_provenance(orphan.get_id()),
            Err(LedgerError::CorruptChain(_))
        ));
    }
}
