// Entry point for the trade-ledger command line.
// Settings come from defaults, then an optional TOML file, then LEDGER_* env
// vars, and finally the global flags below.
use clap::Parser;
use data_encoding::HEXLOWER;
use log::{error, info, LevelFilter};
use std::process;
use trade_ledger::cli::{BlockInfo, TradeInfo};
use trade_ledger::{
    address_to_pub_key_hash, validate_address, Blockchain, Command, Config, LedgerError,
    MineOutcome, Opt, Result, TradePool, UTXOSet, Wallet, Wallets,
};

fn main() {
    // Info level by default, RUST_LOG still wins
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt) {
        if e.is_fatal() {
            error!("Fatal: {e}");
            process::exit(2);
        }
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(opt: &Opt) -> Result<Config> {
    let mut config = Config::load(opt.config.as_deref())?;
    if let Some(dir) = &opt.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(difficulty) = opt.difficulty {
        config.difficulty = difficulty;
    }
    config.validate()?;
    Ok(config)
}

fn local_wallet<'a>(wallets: &'a Wallets, address: &str) -> Result<&'a Wallet> {
    if !validate_address(address) {
        return Err(LedgerError::InvalidAddress(address.to_string()));
    }
    wallets
        .get_wallet(address)
        .ok_or_else(|| LedgerError::InvalidAddress(format!("{address} is not a local wallet")))
}

fn run_command(opt: Opt) -> Result<()> {
    let config = load_config(&opt)?;

    match opt.command {
        Command::Createwallet => {
            let mut wallets = Wallets::load(config.wallets_path())?;
            let address = wallets.create_wallet()?;
            println!("Your new address: {address}")
        }
        Command::ListAddresses => {
            let wallets = Wallets::load(config.wallets_path())?;
            for address in wallets.get_addresses() {
                println!("{address}")
            }
        }
        Command::Createblockchain { address } => {
            let pub_key_hash = address_to_pub_key_hash(&address)?;
            let blockchain = Blockchain::init_blockchain(&config, &pub_key_hash)?;
            info!("Chain tip is {}", hex_tip(&blockchain));
            println!("Done!");
        }
        Command::GetBalance { address } => {
            let pub_key_hash = address_to_pub_key_hash(&address)?;
            let blockchain = Blockchain::continue_blockchain(&config)?;
            let utxo_set = UTXOSet::new(blockchain);

            // Full scan when the key is ours, otherwise the index by key hash
            let wallets = Wallets::load(config.wallets_path())?;
            let balance = match wallets.get_wallet(&address) {
                Some(wallet) => utxo_set.balance(wallet.get_public_key())?,
                None => utxo_set.indexed_balance(&pub_key_hash)?,
            };
            println!("Balance of {address}: {balance}");
        }
        Command::Send {
            from,
            to,
            amount,
            description,
        } => {
            let wallets = Wallets::load(config.wallets_path())?;
            let wallet = local_wallet(&wallets, &from)?;
            let to_pub_key_hash = address_to_pub_key_hash(&to)?;

            let blockchain = Blockchain::continue_blockchain(&config)?;
            let trade = blockchain.create_trade(wallet, &to_pub_key_hash, amount, &description)?;

            let mut pool = TradePool::load(config.trade_pool_path())?;
            pool.add_trade(trade.clone());
            pool.save()?;
            println!(
                "Trade {} added to the pool ({} pending)",
                trade.hex_id(),
                pool.len()
            );
        }
        Command::Mine => {
            let blockchain = Blockchain::continue_blockchain(&config)?;
            match blockchain.mine()? {
                MineOutcome::Mined(block) => println!(
                    "Mined block {} with {} trades",
                    block.hex_hash(),
                    block.get_trades().len()
                ),
                MineOutcome::Rejected(reason) => {
                    println!("Pending trades rejected and dropped: {reason}")
                }
                MineOutcome::ProofRejected => {
                    println!("Mined block failed validation, pending trades kept for retry")
                }
            }
        }
        Command::Printchain { json } => {
            let blockchain = Blockchain::continue_blockchain(&config)?;
            let mut blocks = vec![];
            for block in blockchain.iterator()? {
                blocks.push(BlockInfo::from(&block?));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else {
                for block in &blocks {
                    println!("{block}");
                }
            }
        }
        Command::Trace { address } => {
            let wallets = Wallets::load(config.wallets_path())?;
            let wallet = local_wallet(&wallets, &address)?;
            let blockchain = Blockchain::continue_blockchain(&config)?;
            for trade in blockchain.trace_currency(wallet.get_public_key())? {
                print!("{}", TradeInfo::from(&trade));
            }
        }
        Command::Provenance { trade_id, json } => {
            let trade_id = HEXLOWER
                .decode(trade_id.to_ascii_lowercase().as_bytes())
                .map_err(|e| LedgerError::InvalidTrade(format!("bad trade id {trade_id}: {e}")))?;
            let blockchain = Blockchain::continue_blockchain(&config)?;
            let path: Vec<TradeInfo> = blockchain
                .trace_provenance(&trade_id)?
                .iter()
                .map(TradeInfo::from)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&path)?);
            } else {
                for trade in &path {
                    print!("{trade}");
                }
            }
        }
        Command::Reindexutxo => {
            let blockchain = Blockchain::continue_blockchain(&config)?;
            let utxo_set = UTXOSet::new(blockchain);
            let count = utxo_set.reindex()?;
            println!("Done! There are {count} trades in the UTXO set.");
        }
        Command::Verifychain => {
            let blockchain = Blockchain::continue_blockchain(&config)?;
            let count = blockchain.verify_chain()?;
            println!("Chain OK: {count} blocks verified");
        }
    }
    Ok(())
}

fn hex_tip(blockchain: &Blockchain) -> String {
    HEXLOWER.encode(&blockchain.tip_hash())
}
