use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, DailyStats, DataUpdate, TokenStats, Transfer};

/// Error surfaced by an entity store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

/// Key-value persistence for derived entities: load by id, save as upsert.
///
/// A save is durable once the call returns, and a load observes every save
/// that returned before it. The engine treats the store as the sole source
/// of truth and assumes a single logical writer; there is no delete.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load_account(&self, id: &str) -> Result<Option<Account>, StoreError>;
    async fn save_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn load_token_stats(&self, id: &str) -> Result<Option<TokenStats>, StoreError>;
    async fn save_token_stats(&self, stats: &TokenStats) -> Result<(), StoreError>;

    async fn load_daily_stats(&self, id: &str) -> Result<Option<DailyStats>, StoreError>;
    async fn save_daily_stats(&self, stats: &DailyStats) -> Result<(), StoreError>;

    async fn load_transfer(&self, id: &str) -> Result<Option<Transfer>, StoreError>;
    async fn save_transfer(&self, transfer: &Transfer) -> Result<(), StoreError>;

    async fn load_data_update(&self, id: &str) -> Result<Option<DataUpdate>, StoreError>;
    async fn save_data_update(&self, update: &DataUpdate) -> Result<(), StoreError>;
}
