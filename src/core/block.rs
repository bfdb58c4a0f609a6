use crate::core::{ProofOfWork, Trade};
use crate::error::Result;
use crate::utils::{current_timestamp, deserialize, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Block {
    timestamp: i64,
    hash: Vec<u8>,
    prev_hash: Vec<u8>,
    target: Vec<u8>,
    nonce: i64,
    trades: Vec<Trade>,
}

impl Block {
    /// Unmined block on top of `prev_hash`; hash and nonce are filled in by `seal`.
    pub fn new_candidate(prev_hash: &[u8], trades: Vec<Trade>, target: Vec<u8>) -> Result<Block> {
        Ok(Block {
            timestamp: current_timestamp()?,
            hash: vec![],
            prev_hash: prev_hash.to_vec(),
            target,
            nonce: 0,
            trades,
        })
    }

    /// Builds and mines a block in one step.
    pub fn new_block(prev_hash: &[u8], trades: Vec<Trade>, pow: &ProofOfWork) -> Result<Block> {
        let mut block = Self::new_candidate(prev_hash, trades, pow.target_bytes())?;

        info!(
            "Starting proof-of-work for block with {} trades (difficulty: {})",
            block.trades.len(),
            pow.get_difficulty()
        );
        let nonce = pow.find_nonce(&block)?;
        block.seal(nonce);
        info!(
            "Proof-of-work completed for block: {} (nonce: {nonce})",
            block.hex_hash()
        );

        Ok(block)
    }

    /// Stores `nonce` and the hash it produces.
    pub fn seal(&mut self, nonce: i64) {
        self.nonce = nonce;
        self.hash = self.compute_hash();
    }

    /// timestamp (8 bytes BE) || prev hash || target || nonce (8 bytes BE) || trade ids
    pub fn preimage(&self, nonce: i64) -> Vec<u8> {
        let (prefix, suffix) = self.preimage_parts();
        let mut data = prefix;
        data.extend(nonce.to_be_bytes());
        data.extend(suffix);
        data
    }

    /// Preimage bytes before and after the nonce.
    pub(crate) fn preimage_parts(&self) -> (Vec<u8>, Vec<u8>) {
        let mut prefix = Vec::with_capacity(8 + self.prev_hash.len() + self.target.len());
        prefix.extend(self.timestamp.to_be_bytes());
        prefix.extend(self.prev_hash.as_slice());
        prefix.extend(self.target.as_slice());

        let mut suffix = vec![];
        for trade in &self.trades {
            suffix.extend(trade.get_id());
        }
        (prefix, suffix)
    }

    pub fn compute_hash(&self) -> Vec<u8> {
        sha256_digest(&self.preimage(self.nonce))
    }

    /// Whether the stored hash is the hash of the block's own preimage.
    pub fn has_consistent_hash(&self) -> bool {
        !self.hash.is_empty() && self.hash == self.compute_hash()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_trades(&self) -> &[Trade] {
        self.trades.as_slice()
    }

    pub fn get_prev_hash(&self) -> &[u8] {
        self.prev_hash.as_slice()
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn hex_hash(&self) -> String {
        HEXLOWER.encode(&self.hash)
    }

    pub fn get_target(&self) -> &[u8] {
        self.target.as_slice()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    #[cfg(test)]
    pub(crate) fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }
}
