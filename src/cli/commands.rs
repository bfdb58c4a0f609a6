use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trade-ledger")]
pub struct Opt {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[arg(long = "data-dir", global = true, help = "Directory holding the chain, pool and wallets")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Leading zero bits required of block hashes")]
    pub difficulty: Option<u32>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "createblockchain", about = "Create a new blockchain")]
    Createblockchain {
        #[arg(help = "The address that receives the initial issuance")]
        address: String,
    },
    #[command(
        name = "getbalance",
        about = "Get the balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "send", about = "Create a signed trade and add it to the pool")]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: u64,
        #[arg(long, default_value = "", help = "Free-form trade description")]
        description: String,
    },
    #[command(name = "mine", about = "Mine pending trades into a new block")]
    Mine,
    #[command(name = "printchain", about = "Print all blocks in the blockchain")]
    Printchain {
        #[arg(long, help = "Print blocks as JSON")]
        json: bool,
    },
    #[command(name = "trace", about = "List every trade involving a local wallet")]
    Trace {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "provenance", about = "Follow a trade back to the genesis issuance")]
    Provenance {
        #[arg(help = "Hex encoded trade id")]
        trade_id: String,
        #[arg(long, help = "Print trades as JSON")]
        json: bool,
    },
    #[command(name = "reindexutxo", about = "Rebuild UTXO index set")]
    Reindexutxo,
    #[command(name = "verifychain", about = "Re-check every block and trade")]
    Verifychain,
}
