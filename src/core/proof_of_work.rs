use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::utils::sha256_digest;
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;
use std::sync::atomic::{AtomicBool, Ordering};

const MAX_NONCE: i64 = i64::MAX;
/// Highest accepted difficulty; the target never drops below 2.
pub const MAX_DIFFICULTY: u32 = 255;
/// Nonces tried between two looks at the cancellation flag.
const NONCE_BATCH: i64 = 1 << 16;

/// Fixed-difficulty proof of work: a block hash must be below 2^(256 - difficulty).
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    target: BigInt,
    difficulty: u32,
}

impl ProofOfWork {
    /// Difficulty must be within `1..=MAX_DIFFICULTY`.
    pub fn new(difficulty: u32) -> Result<ProofOfWork> {
        let shift = match 256u32.checked_sub(difficulty) {
            Some(shift) if (1..=MAX_DIFFICULTY).contains(&difficulty) => shift,
            _ => {
                return Err(LedgerError::Config(format!(
                    "difficulty must be within 1..={MAX_DIFFICULTY}, got {difficulty}"
                )))
            }
        };
        let mut target = BigInt::from(1);
        target.shl_assign(shift);
        Ok(ProofOfWork { target, difficulty })
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Big-endian bytes of the target, as stored in blocks.
    pub fn target_bytes(&self) -> Vec<u8> {
        self.target.to_bytes_be().1
    }

    fn hash_below(hash: &[u8], target: &BigInt) -> bool {
        BigInt::from_bytes_be(Sign::Plus, hash) < *target
    }

    /// Recomputes the hash with the block's stored nonce and checks it against
    /// the block's stored target.
    pub fn validate(block: &Block) -> bool {
        let target = BigInt::from_bytes_be(Sign::Plus, block.get_target());
        let hash = sha256_digest(&block.preimage(block.get_nonce()));
        Self::hash_below(&hash, &target)
    }

    /// First nonce, counting up from zero, whose hash is below the block's target.
    pub fn find_nonce(&self, block: &Block) -> Result<i64> {
        let never = AtomicBool::new(false);
        self.find_nonce_cancellable(block, &never)
            .unwrap_or(Err(LedgerError::NonceExhausted))
    }

    /// Like `find_nonce` but returns `None` once `cancel` is observed set.
    /// The flag is read once per batch of nonces.
    pub fn find_nonce_cancellable(&self, block: &Block, cancel: &AtomicBool) -> Option<Result<i64>> {
        let target = BigInt::from_bytes_be(Sign::Plus, block.get_target());
        let (prefix, suffix) = block.preimage_parts();
        let offset = prefix.len();
        let mut data = prefix;
        data.extend(0i64.to_be_bytes());
        data.extend(suffix);

        let mut nonce = 0i64;
        while nonce < MAX_NONCE {
            if nonce % NONCE_BATCH == 0 && cancel.load(Ordering::Relaxed) {
                return None;
            }
            data[offset..offset + 8].copy_from_slice(&nonce.to_be_bytes());
            let hash = sha256_digest(&data);
            if Self::hash_below(&hash, &target) {
                return Some(Ok(nonce));
            }
            nonce += 1;
        }
        Some(Err(LedgerError::NonceExhausted))
    }
}
