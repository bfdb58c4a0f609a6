use crate::core::Trade;
use crate::error::Result;
use crate::utils::{deserialize, serialize};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Pending trades waiting to be mined, persisted as one file.
///
/// The file is rewritten whole on every save and deleted once its trades are
/// mined or rejected. A missing file is an empty pool.
#[derive(Debug)]
pub struct TradePool {
    path: PathBuf,
    trades: Vec<Trade>,
}

impl TradePool {
    pub fn load(path: impl AsRef<Path>) -> Result<TradePool> {
        let path = path.as_ref().to_path_buf();
        let trades = match fs::read(&path) {
            Ok(bytes) => deserialize::<Vec<Trade>>(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No trade pool at {}, starting empty", path.display());
                vec![]
            }
            Err(e) => return Err(e.into()),
        };
        Ok(TradePool { path, trades })
    }

    pub fn add_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Overwrites the pool file with the current trades.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serialize(&self.trades)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved {} pending trades", self.trades.len());
        Ok(())
    }

    /// Drops every pending trade and deletes the pool file.
    pub fn remove(&mut self) -> Result<()> {
        self.trades.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_trades(&self) -> &[Trade] {
        self.trades.as_slice()
    }

    pub fn contains(&self, trade_id: &[u8]) -> bool {
        self.trades.iter().any(|t| t.get_id() == trade_id)
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn get_path(&self) -> &Path {
        self.path.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trade::tests::signed_trade;
    use crate::error::LedgerError;
    use crate::utils::SCHEMA_VERSION;
    use crate::wallet::Wallet;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_pool() {
        let dir = tempdir().unwrap();
        let pool = TradePool::load(dir.path().join("tradePool.data")).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tradePool.data");
        let owner = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let first = signed_trade(&owner, &recipient, 10);
        let second = signed_trade(&owner, &recipient, 20);

        let mut pool = TradePool::load(&path).unwrap();
        pool.add_trade(first.clone());
        pool.add_trade(second.clone());
        pool.save().unwrap();

        let reloaded = TradePool::load(&path).unwrap();
        assert_eq!(reloaded.get_trades(), &[first.clone(), second]);
        assert!(reloaded.contains(first.get_id()));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tradePool.data");
        let owner = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();

        let mut pool = TradePool::load(&path).unwrap();
        pool.add_trade(signed_trade(&owner, &recipient, 10));
        pool.save().unwrap();

        let mut pool = TradePool::load(&path).unwrap();
        pool.remove().unwrap();
        pool.add_trade(signed_trade(&owner, &recipient, 30));
        pool.save().unwrap();

        let reloaded = TradePool::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get_trades()[0].get_outputs()[0].get_amount(), 30);
    }

    #[test]
    fn test_remove_deletes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tradePool.data");
        let owner = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();

        let mut pool = TradePool::load(&path).unwrap();
        pool.add_trade(signed_trade(&owner, &recipient, 10));
        pool.save().unwrap();
        assert!(path.exists());

        pool.remove().unwrap();
        assert!(!path.exists());
        assert!(pool.is_empty());
        // Removing again is fine
        pool.remove().unwrap();
    }

    #[test]
    fn test_corrupt_pool_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tradePool.data");
        fs::write(&path, b"not a pool").unwrap();
        assert!(TradePool::load(&path).is_err());
    }

    #[test]
    fn test_pool_with_huge_length_prefix_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tradePool.data");
        let mut bytes = vec![SCHEMA_VERSION, 0xFD];
        bytes.extend((1u64 << 40).to_le_bytes());
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            TradePool::load(&path),
            Err(LedgerError::Serialization(_))
        ));
    }
}
