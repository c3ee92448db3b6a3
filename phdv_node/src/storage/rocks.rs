use super::{Result, Storage, StorageError};
use async_trait::async_trait;
use log::debug;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

/// RocksDB-backed document store.
pub struct RocksDbStorage {
    db: DB,
}

impl RocksDbStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);

        let db = DB::open(&options, path)
            .map_err(|e| StorageError::ConnectionError(format!("Failed to open database: {e}")))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl Storage for RocksDbStorage {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| StorageError::ReadError(e.to_string()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| StorageError::WriteError(e.to_string()))?;
        debug!("Stored document at key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn write_batch(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for (key, value) in &entries {
            batch.put(key, value);
        }
        self.db
            .write(batch)
            .map_err(|e| StorageError::WriteError(e.to_string()))?;
        debug!("Wrote batch of {} documents", entries.len());
        Ok(())
    }

    async fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item.map_err(|e| StorageError::ReadError(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    async fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| StorageError::WriteError(e.to_string()))
    }
}
