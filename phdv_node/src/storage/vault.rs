//! Typed document store for users and analysis records.
//!
//! Key layout:
//!   `user:<wallet lowercase>`                          -> UserRecord JSON
//!   `report:<wallet lowercase>:<millis 013>:<uuid>`    -> AnalysisRecord JSON
//!
//! The zero-padded creation timestamp makes the lexicographic key order the
//! chronological order, so a prefix scan yields a wallet's reports oldest
//! first.

use super::{Result, Storage, StorageError};
use crate::models::{normalize_wallet, AnalysisRecord, UserRecord};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

const USER_PREFIX: &str = "user:";
const REPORT_PREFIX: &str = "report:";

/// Outcome of applying an analysis reward to a user.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardOutcome {
    pub earned: u64,
    pub total: u64,
    pub is_new_user: bool,
}

pub struct VaultStore {
    backend: Arc<dyn Storage>,
    // Serializes the read-modify-write on user balances.
    write_lock: Mutex<()>,
}

fn user_key(wallet_lower: &str) -> Vec<u8> {
    format!("{USER_PREFIX}{wallet_lower}").into_bytes()
}

fn report_prefix(wallet_lower: &str) -> Vec<u8> {
    format!("{REPORT_PREFIX}{wallet_lower}:").into_bytes()
}

fn report_key(wallet_lower: &str, record: &AnalysisRecord) -> Vec<u8> {
    format!(
        "{REPORT_PREFIX}{wallet_lower}:{:013}:{}",
        record.created_at.timestamp_millis(),
        record.id
    )
    .into_bytes()
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::InvalidData(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StorageError::InvalidData(e.to_string()))
}

impl VaultStore {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Storage liveness probe.
    pub async fn ping(&self) -> Result<()> {
        self.backend.flush().await
    }

    pub async fn find_user(&self, wallet: &str) -> Result<Option<UserRecord>> {
        let key = user_key(&normalize_wallet(wallet));
        match self.backend.get(&key).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns the user, creating a zero-balance record on first sight.
    pub async fn ensure_user(&self, wallet: &str) -> Result<UserRecord> {
        if let Some(user) = self.find_user(wallet).await? {
            return Ok(user);
        }
        let _guard = self.write_lock.lock().await;
        let wallet_lower = normalize_wallet(wallet);
        let key = user_key(&wallet_lower);
        // Re-check under the lock; a concurrent upload may have created it.
        if let Some(bytes) = self.backend.get(&key).await? {
            return decode(&bytes);
        }
        let user = UserRecord::new(wallet_lower, Utc::now());
        self.backend.put(&key, &encode(&user)?).await?;
        Ok(user)
    }

    /// Atomically applies a token reward and inserts the analysis record.
    ///
    /// Both documents land in one batch: either the user gains tokens AND
    /// the report exists, or neither write happened.
    pub async fn reward_and_record(
        &self,
        wallet: &str,
        earned: u64,
        record: AnalysisRecord,
    ) -> Result<RewardOutcome> {
        let _guard = self.write_lock.lock().await;

        let wallet_lower = normalize_wallet(wallet);
        let key = user_key(&wallet_lower);
        let now = Utc::now();

        let mut user = match self.backend.get(&key).await? {
            Some(bytes) => decode::<UserRecord>(&bytes)?,
            None => UserRecord::new(wallet_lower.clone(), now),
        };
        user.tokens += earned;
        user.total_analyses += 1;
        user.last_analysis_date = Some(now);
        user.updated_at = now;
        let is_new_user = user.total_analyses == 1;

        self.backend
            .write_batch(vec![
                (key, encode(&user)?),
                (report_key(&wallet_lower, &record), encode(&record)?),
            ])
            .await?;

        Ok(RewardOutcome {
            earned,
            total: user.tokens,
            is_new_user,
        })
    }

    /// A wallet's analysis records, newest first. Case-insensitive: records
    /// are keyed by the lowercased address regardless of how a route
    /// received it.
    pub async fn find_analyses(&self, wallet: &str) -> Result<Vec<AnalysisRecord>> {
        let prefix = report_prefix(&normalize_wallet(wallet));
        let keys = self.backend.list_keys(&prefix).await?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = self.backend.get(&key).await? {
                records.push(decode(&bytes)?);
            }
        }
        records.reverse();
        Ok(records)
    }
}
