//! # Trade Ledger - a single-node UTXO ledger
//!
//! Value is issued once by a genesis trade and then moves between ECDSA P-256
//! keys through signed trades. Pending trades wait in a file-backed pool until
//! `mine` validates the batch, seals it into a proof-of-work block and
//! appends it to a sled-backed chain.
//!
//! ## Layout
//! - `core/`: trades, blocks, proof of work, the chain and the mining pipeline
//! - `storage/`: unspent-output queries and index, the trade pool
//! - `wallet/`: the `TradeSigner` trait, key pairs, the address codec
//! - `config/`: difficulty, issuance and on-disk locations
//! - `utils/`: hashing, signing and the versioned storage codec
//! - `cli/`: argument parsing and printable views for the binary
//!
//! ## Things to keep in mind
//! - The difficulty is pinned when a chain is created; opening it with another
//!   difficulty is a configuration error.
//! - A trade id is the hash of the trade with every signature blanked.
//! - A broken chain link is fatal; a bad trade only drops the pending batch.
//! - The library logs through `log` and never installs a logger.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{
    Block, Blockchain, BlockchainIterator, MineOutcome, OutPoint, ProofOfWork, RejectReason,
    Trade, TradeIn, TradeOut, GENESIS_ANCHOR,
};
pub use error::{LedgerError, Result};
pub use storage::{TradePool, UTXOSet};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest,
};
pub use wallet::{
    address_to_pub_key_hash, convert_address, hash_pub_key, validate_address, TradeSigner, Wallet,
    Wallets, ADDRESS_CHECK_SUM_LEN,
};
