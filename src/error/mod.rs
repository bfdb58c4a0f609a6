//! Error handling for the ledger
//!
//! Structural failures (broken chain linkage, unreadable store, missing chain)
//! are errors the binary aborts on. Validation failures of a single trade or a
//! mining attempt are reported as values by the mining pipeline instead.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Database-related errors
    Database(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Key handling and signing errors
    Crypto(String),
    /// Configuration errors
    Config(String),
    /// Invalid address format
    InvalidAddress(String),
    /// A trade could not be built or is malformed
    InvalidTrade(String),
    /// Insufficient funds for a transfer
    InsufficientFunds { required: u64, available: u64 },
    /// Candidate block failed hash, target or proof-of-work checks
    InvalidBlock(String),
    /// Candidate block does not extend the persisted tip
    ChainLinkage { expected: String, found: String },
    /// No chain exists in the store
    ChainNotFound,
    /// The whole nonce space was searched without success
    NonceExhausted,
    /// A committed block no longer satisfies the chain invariants
    CorruptChain(String),
}

impl LedgerError {
    /// Errors after which the process must not keep writing to the chain.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::Database(_)
                | LedgerError::ChainLinkage { .. }
                | LedgerError::ChainNotFound
                | LedgerError::NonceExhausted
                | LedgerError::CorruptChain(_)
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Database(msg) => write!(f, "Database error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            LedgerError::InvalidTrade(msg) => write!(f, "Invalid trade: {msg}"),
            LedgerError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::ChainLinkage { expected, found } => write!(
                f,
                "Chain linkage violation: block extends {found} but the tip is {expected}"
            ),
            LedgerError::ChainNotFound => {
                write!(f, "No existing blockchain found. Create one first.")
            }
            LedgerError::NonceExhausted => write!(f, "Nonce space exhausted without a valid proof"),
            LedgerError::CorruptChain(msg) => write!(f, "Corrupt chain: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for LedgerError {
    fn from(err: bincode::error::DecodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
