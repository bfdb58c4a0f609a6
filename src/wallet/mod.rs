//! Keys, signing and addresses
//!
//! The ledger only depends on the `TradeSigner` trait and the address codec.
//! `Wallets` is the small on-disk key store the binary uses.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{
    address_to_pub_key_hash, convert_address, hash_pub_key, validate_address, TradeSigner, Wallet,
    ADDRESS_CHECK_SUM_LEN,
};
pub use wallets::Wallets;
