use crate::core::{Block, ProofOfWork, Trade};
use crate::wallet::{convert_address, hash_pub_key};
use data_encoding::HEXLOWER;
use serde::Serialize;
use std::fmt;

/// Printable form of a block with byte fields hex encoded.
#[derive(Debug, Clone, Serialize)]
pub struct BlockInfo {
    pub hash: String,
    pub prev_hash: String,
    pub timestamp: i64,
    pub nonce: i64,
    pub target: String,
    pub pow_valid: bool,
    pub trades: Vec<TradeInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeInfo {
    pub id: String,
    pub description: String,
    pub coinbase: bool,
    pub inputs: Vec<InputInfo>,
    pub outputs: Vec<OutputInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    pub trade_id: String,
    pub out_index: i64,
    /// Signer address, absent on the genesis input.
    pub from: Option<String>,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputInfo {
    pub amount: u64,
    pub to: String,
}

impl From<&Trade> for TradeInfo {
    fn from(trade: &Trade) -> Self {
        let coinbase = trade.is_coinbase();
        TradeInfo {
            id: trade.hex_id(),
            description: trade.get_description().to_string(),
            coinbase,
            inputs: trade
                .get_inputs()
                .iter()
                .map(|input| InputInfo {
                    trade_id: HEXLOWER.encode(input.get_trade_id()),
                    out_index: input.get_out_index(),
                    from: (!coinbase)
                        .then(|| convert_address(&hash_pub_key(input.get_pub_key()))),
                    signature: HEXLOWER.encode(input.get_signature()),
                })
                .collect(),
            outputs: trade
                .get_outputs()
                .iter()
                .map(|output| OutputInfo {
                    amount: output.get_amount(),
                    to: convert_address(output.get_pub_key_hash()),
                })
                .collect(),
        }
    }
}

impl From<&Block> for BlockInfo {
    fn from(block: &Block) -> Self {
        BlockInfo {
            hash: block.hex_hash(),
            prev_hash: HEXLOWER.encode(block.get_prev_hash()),
            timestamp: block.get_timestamp(),
            nonce: block.get_nonce(),
            target: HEXLOWER.encode(block.get_target()),
            pow_valid: ProofOfWork::validate(block),
            trades: block.get_trades().iter().map(TradeInfo::from).collect(),
        }
    }
}

impl fmt::Display for TradeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Trade {} \"{}\"", self.id, self.description)?;
        if !self.coinbase {
            for input in &self.inputs {
                writeln!(
                    f,
                    "-- Input trade = {}, index = {}, from = {}",
                    input.trade_id,
                    input.out_index,
                    input.from.as_deref().unwrap_or("-")
                )?;
            }
        }
        for output in &self.outputs {
            writeln!(f, "-- Output amount = {}, to = {}", output.amount, output.to)?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prev block hash: {}", self.prev_hash)?;
        writeln!(f, "Cur block hash: {}", self.hash)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "PoW: {}", self.pow_valid)?;
        for trade in &self.trades {
            write!(f, "{trade}")?;
        }
        Ok(())
    }
}
