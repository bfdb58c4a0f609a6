//! Command-line interface
//!
//! Argument parsing for the `trade-ledger` binary and the printable views of
//! blocks and trades it emits.

pub mod commands;
pub mod views;

pub use commands::{Command, Opt};
pub use views::{BlockInfo, TradeInfo};
