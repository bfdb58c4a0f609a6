//! Configuration management
//!
//! Difficulty, initial issuance and on-disk locations. Values come from
//! defaults, an optional TOML file and `LEDGER_*` environment variables.

pub mod settings;

pub use settings::Config;
