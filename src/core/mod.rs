//! Core ledger functionality
//!
//! Trades, blocks, proof of work, the persisted chain and the mining
//! pipeline that turns pending trades into blocks.

pub mod block;
pub mod blockchain;
pub mod mining;
pub mod proof_of_work;
pub mod trade;

pub use block::Block;
pub use blockchain::{Blockchain, BlockchainIterator, GENESIS_ANCHOR};
pub use mining::{MineOutcome, RejectReason};
pub use proof_of_work::ProofOfWork;
pub use trade::{OutPoint, Trade, TradeIn, TradeOut, COINBASE_OUT_INDEX, FIRST_TRADE_DESCRIPTION};
