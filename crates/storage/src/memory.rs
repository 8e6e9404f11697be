use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{Account, DailyStats, DataUpdate, TokenStats, Transfer};
use crate::store::{EntityStore, StoreError};

/// In-memory [`EntityStore`] backed by hash maps.
///
/// The reference model of the store contract: a save is visible to the next
/// load, and nothing else mutates state. Used throughout the engine tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    token_stats: HashMap<String, TokenStats>,
    daily_stats: HashMap<String, DailyStats>,
    transfers: HashMap<String, Transfer>,
    data_updates: HashMap<String, DataUpdate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transfer records.
    pub async fn transfer_records(&self) -> usize {
        self.inner.lock().await.transfers.len()
    }

    /// Number of stored data-update records.
    pub async fn data_update_records(&self) -> usize {
        self.inner.lock().await.data_updates.len()
    }

    /// Number of stored accounts, sentinel included.
    pub async fn account_records(&self) -> usize {
        self.inner.lock().await.accounts.len()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.lock().await.accounts.get(id).cloned())
    }

    async fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn load_token_stats(&self, id: &str) -> Result<Option<TokenStats>, StoreError> {
        Ok(self.inner.lock().await.token_stats.get(id).cloned())
    }

    async fn save_token_stats(&self, stats: &TokenStats) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .token_stats
            .insert(stats.id.clone(), stats.clone());
        Ok(())
    }

    async fn load_daily_stats(&self, id: &str) -> Result<Option<DailyStats>, StoreError> {
        Ok(self.inner.lock().await.daily_stats.get(id).cloned())
    }

    async fn save_daily_stats(&self, stats: &DailyStats) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .daily_stats
            .insert(stats.id.clone(), stats.clone());
        Ok(())
    }

    async fn load_transfer(&self, id: &str) -> Result<Option<Transfer>, StoreError> {
        Ok(self.inner.lock().await.transfers.get(id).cloned())
    }

    async fn save_transfer(&self, transfer: &Transfer) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .transfers
            .insert(transfer.id.clone(), transfer.clone());
        Ok(())
    }

    async fn load_data_update(&self, id: &str) -> Result<Option<DataUpdate>, StoreError> {
        Ok(self.inner.lock().await.data_updates.get(id).cloned())
    }

    async fn save_data_update(&self, update: &DataUpdate) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .data_updates
            .insert(update.id.clone(), update.clone());
        Ok(())
    }
}
