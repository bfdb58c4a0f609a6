use crate::core::proof_of_work::MAX_DIFFICULTY;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

static DEFAULT_DATA_DIR: &str = "./files";
const DEFAULT_DIFFICULTY: u32 = 12;
const DEFAULT_INITIAL_ISSUANCE: u64 = 1000;

const DATA_DIR_KEY: &str = "LEDGER_DATA_DIR";
const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const INITIAL_ISSUANCE_KEY: &str = "LEDGER_INITIAL_ISSUANCE";

const BLOCKS_DIR: &str = "blocks";
const TRADE_POOL_FILE: &str = "tradePool.data";
const WALLETS_FILE: &str = "wallets.dat";

/// Ledger settings, fixed for the lifetime of an opened chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Leading zero bits required of a block hash.
    pub difficulty: u32,
    /// Units issued to the owner by the genesis trade.
    pub initial_issuance: u64,
}

/// Shape of the optional TOML file; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    difficulty: Option<u32>,
    initial_issuance: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            difficulty: DEFAULT_DIFFICULTY,
            initial_issuance: DEFAULT_INITIAL_ISSUANCE,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file if given, then environment overrides.
    pub fn load(file: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();
        if let Some(path) = file {
            let text = fs::read_to_string(path)?;
            config.apply_file(toml::from_str(&text)?);
        }
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Settings rooted at `data_dir` with the given difficulty, defaults otherwise.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>, difficulty: u32) -> Config {
        Config {
            data_dir: data_dir.into(),
            difficulty,
            ..Config::default()
        }
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(difficulty) = file.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(issuance) = file.initial_issuance {
            self.initial_issuance = issuance;
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = env::var(DATA_DIR_KEY) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = env::var(DIFFICULTY_KEY) {
            self.difficulty = raw
                .parse()
                .map_err(|e| LedgerError::Config(format!("{DIFFICULTY_KEY}={raw}: {e}")))?;
        }
        if let Ok(raw) = env::var(INITIAL_ISSUANCE_KEY) {
            self.initial_issuance = raw
                .parse()
                .map_err(|e| LedgerError::Config(format!("{INITIAL_ISSUANCE_KEY}={raw}: {e}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(LedgerError::Config(format!(
                "difficulty must be within 1..={MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if self.initial_issuance == 0 {
            return Err(LedgerError::Config(
                "initial issuance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn blocks_path(&self) -> PathBuf {
        self.data_dir.join(BLOCKS_DIR)
    }

    pub fn trade_pool_path(&self) -> PathBuf {
        self.data_dir.join(TRADE_POOL_FILE)
    }

    pub fn wallets_path(&self) -> PathBuf {
        self.data_dir.join(WALLETS_FILE)
    }
}
