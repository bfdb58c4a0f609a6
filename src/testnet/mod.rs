//! Low-difficulty ledger fixtures for unit tests.

pub mod test_utils;

pub use test_utils::*;
