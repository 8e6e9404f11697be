use alloy::primitives::Address;
use chrono::DateTime;

use tokenscope_storage::EntityStore;
use tokenscope_storage::models::{Account, DailyStats, SECONDS_PER_DAY, TOKEN_STATS_ID, TokenStats};

use crate::error::EngineError;

/// Lowercase hex id for an address.
pub fn account_id(address: &Address) -> String {
    format!("{address:#x}")
}

/// Start of the UTC day bucket containing `timestamp`.
pub fn day_bucket(timestamp: u64) -> u64 {
    timestamp - timestamp % SECONDS_PER_DAY
}

/// ISO `YYYY-MM-DD` for a bucket start.
fn bucket_date(bucket: u64) -> String {
    DateTime::from_timestamp(bucket as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Load an account by address, creating and persisting a zeroed record on
/// first sight.
///
/// Creating a non-zero address also bumps `TokenStats::unique_holders` and
/// persists the stats before returning; the zero address is stored but never
/// counted. On a hit only `last_seen_at` is refreshed, in memory: persisting
/// the account stays with the caller so its field changes land in one write.
pub async fn get_or_create_account<S: EntityStore>(
    store: &S,
    address: &Address,
    timestamp: u64,
) -> Result<Account, EngineError> {
    let id = account_id(address);
    match store.load_account(&id).await? {
        Some(mut account) => {
            account.last_seen_at = timestamp;
            Ok(account)
        }
        None => {
            let account = Account::new(id, timestamp);
            store.save_account(&account).await?;

            if *address != Address::ZERO {
                let mut stats = get_or_create_token_stats(store).await?;
                stats.unique_holders += 1;
                store.save_token_stats(&stats).await?;
            }

            Ok(account)
        }
    }
}

/// Load the global stats singleton, persisting a zeroed record on first
/// access. Every later call loads that same record.
pub async fn get_or_create_token_stats<S: EntityStore>(
    store: &S,
) -> Result<TokenStats, EngineError> {
    match store.load_token_stats(TOKEN_STATS_ID).await? {
        Some(stats) => Ok(stats),
        None => {
            let stats = TokenStats::new();
            store.save_token_stats(&stats).await?;
            Ok(stats)
        }
    }
}

/// Load the day bucket covering `timestamp`, creating it lazily. The date
/// string is derived once here and never recomputed.
pub async fn get_or_create_daily_stats<S: EntityStore>(
    store: &S,
    timestamp: u64,
) -> Result<DailyStats, EngineError> {
    let bucket = day_bucket(timestamp);
    let id = bucket.to_string();
    match store.load_daily_stats(&id).await? {
        Some(stats) => Ok(stats),
        None => {
            let stats = DailyStats::new(id, bucket_date(bucket));
            store.save_daily_stats(&stats).await?;
            Ok(stats)
        }
    }
}
