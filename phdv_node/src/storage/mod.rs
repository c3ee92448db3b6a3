use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use std::fmt;

pub mod memory;
pub mod rocks;
pub mod vault;

pub use memory::MemoryStorage;
pub use rocks::RocksDbStorage;
pub use vault::{RewardOutcome, VaultStore};

// Storage-specific Result type
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageError {
    NotFound(String),
    WriteError(String),
    ReadError(String),
    ConnectionError(String),
    InvalidData(String),
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::WriteError(msg) => write!(f, "Write error: {}", msg),
            StorageError::ReadError(msg) => write!(f, "Read error: {}", msg),
            StorageError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            StorageError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Key-value document backend. Values are JSON bytes; key prefixes group
/// the two collections (`user:`, `report:`).
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Write several entries in one atomic batch.
    async fn write_batch(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()>;

    /// Keys under `prefix`, ascending lexicographic order.
    async fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>>;

    async fn flush(&self) -> Result<()>;
}
