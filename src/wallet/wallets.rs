use crate::error::Result;
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File-backed key store used by the command line front end.
pub struct Wallets {
    path: PathBuf,
    wallets: HashMap<String, Wallet>,
}

impl Wallets {
    /// Opens the store at `path`; a missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Wallets> {
        let path = path.as_ref().to_path_buf();
        let wallets = if path.exists() {
            let bytes = fs::read(&path)?;
            deserialize(&bytes)?
        } else {
            HashMap::new()
        };
        Ok(Wallets { path, wallets })
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.wallets.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(serialize(&self.wallets)?.as_slice())?;
        writer.flush()?;
        Ok(())
    }
}
