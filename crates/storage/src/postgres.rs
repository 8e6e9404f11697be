use alloy::primitives::{I256, U256};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::models::{Account, DailyStats, DataUpdate, TokenStats, Transfer};
use crate::store::{EntityStore, StoreError};

/// PostgreSQL-backed [`EntityStore`].
///
/// Every save is a full-row upsert keyed by the entity's primary key and is
/// durable once the call returns. Big integers are stored as TEXT and cast
/// to NUMERIC where SQL-side ordering needs them.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ─── Row Types ──────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct AccountRow {
    id: String,
    balance: String,
    total_sent: String,
    total_received: String,
    transfer_count: i64,
    data_update_count: i64,
    first_seen_at: i64,
    last_seen_at: i64,
}

#[derive(FromRow)]
struct TokenStatsRow {
    id: String,
    total_supply: String,
    total_transfers: i64,
    total_data_updates: i64,
    unique_holders: i64,
    last_update_at: i64,
}

#[derive(FromRow)]
struct DailyStatsRow {
    id: String,
    date: String,
    transfer_count: i64,
    data_update_count: i64,
    unique_users: i64,
    volume: String,
}

#[derive(FromRow)]
struct TransferRow {
    id: String,
    from_account: String,
    from_address: String,
    to_account: String,
    to_address: String,
    value: String,
    timestamp: i64,
    block_number: i64,
    transaction_hash: String,
}

#[derive(FromRow)]
struct DataUpdateRow {
    id: String,
    user_account: String,
    user_address: String,
    token_id: String,
    data: String,
    timestamp: i64,
    block_number: i64,
    transaction_hash: String,
}

fn parse_unsigned(entity: &'static str, id: &str, raw: &str) -> Result<U256, StoreError> {
    raw.parse().map_err(|e| StoreError::Corrupt {
        entity,
        id: id.to_string(),
        reason: format!("bad unsigned integer `{raw}`: {e}"),
    })
}

fn parse_signed(entity: &'static str, id: &str, raw: &str) -> Result<I256, StoreError> {
    raw.parse().map_err(|e| StoreError::Corrupt {
        entity,
        id: id.to_string(),
        reason: format!("bad signed integer `{raw}`: {e}"),
    })
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            balance: parse_signed("account", &row.id, &row.balance)?,
            total_sent: parse_unsigned("account", &row.id, &row.total_sent)?,
            total_received: parse_unsigned("account", &row.id, &row.total_received)?,
            transfer_count: row.transfer_count as u64,
            data_update_count: row.data_update_count as u64,
            first_seen_at: row.first_seen_at as u64,
            last_seen_at: row.last_seen_at as u64,
            id: row.id,
        })
    }
}

impl TryFrom<TokenStatsRow> for TokenStats {
    type Error = StoreError;

    fn try_from(row: TokenStatsRow) -> Result<Self, Self::Error> {
        Ok(TokenStats {
            total_supply: parse_signed("token-stats", &row.id, &row.total_supply)?,
            total_transfers: row.total_transfers as u64,
            total_data_updates: row.total_data_updates as u64,
            unique_holders: row.unique_holders as u64,
            last_update_at: row.last_update_at as u64,
            id: row.id,
        })
    }
}

impl TryFrom<DailyStatsRow> for DailyStats {
    type Error = StoreError;

    fn try_from(row: DailyStatsRow) -> Result<Self, Self::Error> {
        Ok(DailyStats {
            volume: parse_unsigned("daily-stats", &row.id, &row.volume)?,
            transfer_count: row.transfer_count as u64,
            data_update_count: row.data_update_count as u64,
            unique_users: row.unique_users as u64,
            date: row.date,
            id: row.id,
        })
    }
}

impl TryFrom<TransferRow> for Transfer {
    type Error = StoreError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        Ok(Transfer {
            value: parse_unsigned("transfer", &row.id, &row.value)?,
            from: row.from_account,
            from_address: row.from_address,
            to: row.to_account,
            to_address: row.to_address,
            timestamp: row.timestamp as u64,
            block_number: row.block_number as u64,
            transaction_hash: row.transaction_hash,
            id: row.id,
        })
    }
}

impl TryFrom<DataUpdateRow> for DataUpdate {
    type Error = StoreError;

    fn try_from(row: DataUpdateRow) -> Result<Self, Self::Error> {
        Ok(DataUpdate {
            token_id: parse_unsigned("data-update", &row.id, &row.token_id)?,
            user: row.user_account,
            user_address: row.user_address,
            data: row.data,
            timestamp: row.timestamp as u64,
            block_number: row.block_number as u64,
            transaction_hash: row.transaction_hash,
            id: row.id,
        })
    }
}

// ─── EntityStore ────────────────────────────────────────────────────────────

#[async_trait]
impl EntityStore for PgStore {
    async fn load_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Account::try_from).transpose()
    }

    async fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, balance, total_sent, total_received, transfer_count, data_update_count, first_seen_at, last_seen_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                balance = $2,
                total_sent = $3,
                total_received = $4,
                transfer_count = $5,
                data_update_count = $6,
                last_seen_at = $8
            "#,
        )
        .bind(&account.id)
        .bind(account.balance.to_string())
        .bind(account.total_sent.to_string())
        .bind(account.total_received.to_string())
        .bind(account.transfer_count as i64)
        .bind(account.data_update_count as i64)
        .bind(account.first_seen_at as i64)
        .bind(account.last_seen_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_token_stats(&self, id: &str) -> Result<Option<TokenStats>, StoreError> {
        let row: Option<TokenStatsRow> = sqlx::query_as("SELECT * FROM token_stats WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TokenStats::try_from).transpose()
    }

    async fn save_token_stats(&self, stats: &TokenStats) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO token_stats (id, total_supply, total_transfers, total_data_updates, unique_holders, last_update_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                total_supply = $2,
                total_transfers = $3,
                total_data_updates = $4,
                unique_holders = $5,
                last_update_at = $6
            "#,
        )
        .bind(&stats.id)
        .bind(stats.total_supply.to_string())
        .bind(stats.total_transfers as i64)
        .bind(stats.total_data_updates as i64)
        .bind(stats.unique_holders as i64)
        .bind(stats.last_update_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_daily_stats(&self, id: &str) -> Result<Option<DailyStats>, StoreError> {
        let row: Option<DailyStatsRow> = sqlx::query_as("SELECT * FROM daily_stats WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DailyStats::try_from).transpose()
    }

    async fn save_daily_stats(&self, stats: &DailyStats) -> Result<(), StoreError> {
        // `date` is derived from the id at creation and never recomputed.
        sqlx::query(
            r#"
            INSERT INTO daily_stats (id, date, transfer_count, data_update_count, unique_users, volume)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                transfer_count = $3,
                data_update_count = $4,
                unique_users = $5,
                volume = $6
            "#,
        )
        .bind(&stats.id)
        .bind(&stats.date)
        .bind(stats.transfer_count as i64)
        .bind(stats.data_update_count as i64)
        .bind(stats.unique_users as i64)
        .bind(stats.volume.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_transfer(&self, id: &str) -> Result<Option<Transfer>, StoreError> {
        let row: Option<TransferRow> = sqlx::query_as("SELECT * FROM transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Transfer::try_from).transpose()
    }

    async fn save_transfer(&self, transfer: &Transfer) -> Result<(), StoreError> {
        // Append-only: replaying the same composite id is a no-op.
        sqlx::query(
            r#"
            INSERT INTO transfers (id, from_account, from_address, to_account, to_address, value, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.from)
        .bind(&transfer.from_address)
        .bind(&transfer.to)
        .bind(&transfer.to_address)
        .bind(transfer.value.to_string())
        .bind(transfer.timestamp as i64)
        .bind(transfer.block_number as i64)
        .bind(&transfer.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_data_update(&self, id: &str) -> Result<Option<DataUpdate>, StoreError> {
        let row: Option<DataUpdateRow> = sqlx::query_as("SELECT * FROM data_updates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DataUpdate::try_from).transpose()
    }

    async fn save_data_update(&self, update: &DataUpdate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO data_updates (id, user_account, user_address, token_id, data, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&update.id)
        .bind(&update.user)
        .bind(&update.user_address)
        .bind(update.token_id.to_string())
        .bind(&update.data)
        .bind(update.timestamp as i64)
        .bind(update.block_number as i64)
        .bind(&update.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ─── Read-Side Queries ──────────────────────────────────────────────────────
// Consumed by an external query layer; the engine itself never reads these.

impl PgStore {
    /// Most recent transfers, newest first.
    pub async fn recent_transfers(&self, limit: i64) -> Result<Vec<Transfer>, StoreError> {
        let rows: Vec<TransferRow> = sqlx::query_as(
            "SELECT * FROM transfers ORDER BY timestamp DESC, block_number DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Transfer::try_from).collect()
    }

    /// Most recent data updates, newest first (by block time).
    pub async fn recent_data_updates(&self, limit: i64) -> Result<Vec<DataUpdate>, StoreError> {
        let rows: Vec<DataUpdateRow> = sqlx::query_as(
            "SELECT * FROM data_updates ORDER BY block_number DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DataUpdate::try_from).collect()
    }

    /// Top holders ordered by balance descending.
    pub async fn top_holders(&self, limit: i64) -> Result<Vec<Account>, StoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT * FROM accounts
            WHERE CAST(balance AS NUMERIC) > 0
            ORDER BY CAST(balance AS NUMERIC) DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    /// The latest day buckets, newest first.
    pub async fn recent_daily_stats(&self, limit: i64) -> Result<Vec<DailyStats>, StoreError> {
        let rows: Vec<DailyStatsRow> = sqlx::query_as(
            "SELECT * FROM daily_stats ORDER BY CAST(id AS BIGINT) DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DailyStats::try_from).collect()
    }
}

// ─── Indexer State ──────────────────────────────────────────────────────────

impl PgStore {
    /// Last block the indexer fully processed, 0 if none.
    pub async fn last_indexed_block(&self) -> Result<i64, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM indexer_state WHERE key = 'last_indexed_block'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|r| r.0.parse::<i64>().ok()).unwrap_or(0))
    }

    /// Advance the indexer cursor.
    pub async fn set_last_indexed_block(&self, block_number: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO indexer_state (key, value)
            VALUES ('last_indexed_block', $1)
            ON CONFLICT (key) DO UPDATE SET value = $1
            "#,
        )
        .bind(block_number.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
