//! Data storage and persistence
//!
//! Unspent-output queries and index over the chain, and the file-backed pool
//! of trades waiting to be mined.

pub mod trade_pool;
pub mod utxo_set;

pub use trade_pool::TradePool;
pub use utxo_set::{IndexedOutput, UTXOSet};
