// Trades move value from earlier outputs (inputs) to new outputs.
// A trade's id is the SHA-256 of its content with every signature blanked, so
// signing never changes the id. Each input is signed over its own redacted
// copy of the trade, which lets inputs owned by different keys be signed
// independently.

use crate::error::{LedgerError, Result};
use crate::utils::{ecdsa_p256_sha256_sign_verify, encode_canonical, sha256_digest};
use crate::wallet::{hash_pub_key, TradeSigner};
use data_encoding::HEXLOWER;
use log::warn;
use serde::{Deserialize, Serialize};

/// Output index carried by the single input of the genesis trade.
pub const COINBASE_OUT_INDEX: i64 = -1;
/// Description of the genesis trade; provenance tracing stops here.
pub const FIRST_TRADE_DESCRIPTION: &str = "first trade";

/// Reference to one output of an earlier trade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub trade_id: Vec<u8>,
    pub index: usize,
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", HEXLOWER.encode(&self.trade_id), self.index)
    }
}

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TradeIn {
    trade_id: Vec<u8>,
    out_index: i64,
    pub_key: Vec<u8>,
    signature: Vec<u8>,
}

impl TradeIn {
    /// Unsigned input spending `out_index` of `trade_id` on behalf of `pub_key`.
    pub fn new(trade_id: &[u8], out_index: usize, pub_key: &[u8]) -> Result<TradeIn> {
        let out_index = i64::try_from(out_index)
            .map_err(|_| LedgerError::InvalidTrade(format!("output index {out_index} too large")))?;
        Ok(TradeIn {
            trade_id: trade_id.to_vec(),
            out_index,
            pub_key: pub_key.to_vec(),
            signature: vec![],
        })
    }

    fn coinbase() -> TradeIn {
        TradeIn {
            out_index: COINBASE_OUT_INDEX,
            ..Default::default()
        }
    }

    pub fn get_trade_id(&self) -> &[u8] {
        self.trade_id.as_slice()
    }

    pub fn get_out_index(&self) -> i64 {
        self.out_index
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    /// The output this input spends; `None` for the genesis input.
    pub fn outpoint(&self) -> Option<OutPoint> {
        let index = usize::try_from(self.out_index).ok()?;
        Some(OutPoint {
            trade_id: self.trade_id.clone(),
            index,
        })
    }

    pub fn is_signed_by(&self, pub_key: &[u8]) -> bool {
        self.pub_key == pub_key
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TradeOut {
    amount: u64,
    pub_key_hash: Vec<u8>,
}

impl TradeOut {
    pub fn new(amount: u64, pub_key_hash: &[u8]) -> TradeOut {
        TradeOut {
            amount,
            pub_key_hash: pub_key_hash.to_vec(),
        }
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        self.pub_key_hash.as_slice()
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash == pub_key_hash
    }

    /// Whether the holder of `pub_key` can spend this output.
    pub fn is_owned_by(&self, pub_key: &[u8]) -> bool {
        self.is_locked_with_key(&hash_pub_key(pub_key))
    }
}

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Trade {
    id: Vec<u8>,
    inputs: Vec<TradeIn>,
    outputs: Vec<TradeOut>,
    description: String,
}

impl Trade {
    /// Genesis trade issuing `issuance` units to `recipient_pub_key_hash`.
    pub fn first_trade(recipient_pub_key_hash: &[u8], issuance: u64) -> Result<Trade> {
        let mut trade = Trade {
            id: vec![],
            inputs: vec![TradeIn::coinbase()],
            outputs: vec![TradeOut::new(issuance, recipient_pub_key_hash)],
            description: FIRST_TRADE_DESCRIPTION.to_string(),
        };
        trade.set_id()?;
        Ok(trade)
    }

    /// Unsigned trade with its id already computed.
    pub fn new(inputs: Vec<TradeIn>, outputs: Vec<TradeOut>, description: &str) -> Result<Trade> {
        let mut trade = Trade {
            id: vec![],
            inputs,
            outputs,
            description: description.to_string(),
        };
        trade.set_id()?;
        Ok(trade)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].out_index == COINBASE_OUT_INDEX
    }

    /// SHA-256 of the trade with id and all signatures blanked.
    pub fn content_hash(&self) -> Result<Vec<u8>> {
        let mut copy = self.clone();
        copy.id = vec![];
        for input in copy.inputs.iter_mut() {
            input.signature = vec![];
        }
        Ok(sha256_digest(&encode_canonical(&copy)?))
    }

    pub fn set_id(&mut self) -> Result<()> {
        self.id = self.content_hash()?;
        Ok(())
    }

    fn plain_copy(&self) -> Trade {
        let inputs = self
            .inputs
            .iter()
            .map(|input| TradeIn {
                trade_id: input.trade_id.clone(),
                out_index: input.out_index,
                pub_key: vec![],
                signature: vec![],
            })
            .collect();
        Trade {
            id: self.id.clone(),
            inputs,
            outputs: self.outputs.clone(),
            description: self.description.clone(),
        }
    }

    /// Message signed for input `idx`: the encoded plain copy with only that
    /// input's key restored. The signature scheme hashes it with SHA-256 once.
    fn signing_message(&self, idx: usize) -> Result<Vec<u8>> {
        let mut copy = self.plain_copy();
        copy.inputs[idx].pub_key = self.inputs[idx].pub_key.clone();
        encode_canonical(&copy)
    }

    /// Signs every input declared by `signer`. Other inputs are left for their own keys.
    pub fn sign<S: TradeSigner + ?Sized>(&mut self, signer: &S) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }

        let mut signed = 0;
        for idx in 0..self.inputs.len() {
            if !self.inputs[idx].is_signed_by(signer.public_key()) {
                continue;
            }
            let message = self.signing_message(idx)?;
            self.inputs[idx].signature = signer.sign(&message)?;
            signed += 1;
        }

        if signed == 0 {
            return Err(LedgerError::Crypto(format!(
                "signer owns no input of trade {}",
                HEXLOWER.encode(&self.id)
            )));
        }
        Ok(())
    }

    /// Checks the id and every input signature; fails closed on the first problem.
    pub fn verify(&self) -> bool {
        match self.content_hash() {
            Ok(hash) if hash == self.id => {}
            _ => {
                warn!("Trade {} does not match its content hash", self.hex_id());
                return false;
            }
        }

        if self.is_coinbase() {
            let input = &self.inputs[0];
            return input.trade_id.is_empty()
                && input.pub_key.is_empty()
                && input.signature.is_empty();
        }

        if self.inputs.is_empty() {
            warn!("Trade {} has no inputs", self.hex_id());
            return false;
        }

        for (idx, input) in self.inputs.iter().enumerate() {
            if input.out_index < 0 {
                return false;
            }
            let message = match self.signing_message(idx) {
                Ok(message) => message,
                Err(_) => return false,
            };
            if !ecdsa_p256_sha256_sign_verify(&input.pub_key, &input.signature, &message) {
                warn!(
                    "Signature check failed for input {idx} of trade {}",
                    self.hex_id()
                );
                return false;
            }
        }
        true
    }

    /// Sum of all output amounts, `None` on overflow.
    pub fn output_total(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.amount))
    }

    pub fn involves(&self, pub_key: &[u8]) -> bool {
        let pub_key_hash = hash_pub_key(pub_key);
        self.inputs.iter().any(|input| input.is_signed_by(pub_key))
            || self
                .outputs
                .iter()
                .any(|out| out.is_locked_with_key(&pub_key_hash))
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn hex_id(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn get_inputs(&self) -> &[TradeIn] {
        self.inputs.as_slice()
    }

    pub fn get_outputs(&self) -> &[TradeOut] {
        self.outputs.as_slice()
    }

    pub fn get_description(&self) -> &str {
        self.description.as_str()
    }
}
