use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

/// Fixed id of the singleton [`TokenStats`] record.
pub const TOKEN_STATS_ID: &str = "token-stats";

/// Lowercase hex form of the mint/burn sentinel address.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Seconds in one UTC day bucket.
pub const SECONDS_PER_DAY: u64 = 86_400;

// ─── Account ────────────────────────────────────────────────────────────────

/// Per-address state; one record per distinct address ever observed.
///
/// The zero address gets a record like any other (its `last_seen_at` is kept
/// current), but it never counts toward `TokenStats::unique_holders` and its
/// balance is never touched by mints or burns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Lowercase hex address.
    pub id: String,
    /// Current holdings. Signed so that replay outside canonical order can
    /// drive it transiently negative.
    pub balance: I256,
    pub total_sent: U256,
    pub total_received: U256,
    /// Transfer events touching this account on either side.
    pub transfer_count: u64,
    /// Data-update events issued by this account.
    pub data_update_count: u64,
    /// Set once at creation, never overwritten.
    pub first_seen_at: u64,
    pub last_seen_at: u64,
}

impl Account {
    /// Zero-valued account first observed at `timestamp`.
    pub fn new(id: String, timestamp: u64) -> Self {
        Self {
            id,
            balance: I256::ZERO,
            total_sent: U256::ZERO,
            total_received: U256::ZERO,
            transfer_count: 0,
            data_update_count: 0,
            first_seen_at: timestamp,
            last_seen_at: timestamp,
        }
    }
}

// ─── TokenStats ─────────────────────────────────────────────────────────────

/// Global token statistics. Singleton, keyed by [`TOKEN_STATS_ID`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStats {
    pub id: String,
    /// Signed running supply: mints add, burns subtract.
    pub total_supply: I256,
    pub total_transfers: u64,
    pub total_data_updates: u64,
    /// Distinct non-zero addresses ever seen. Never decremented.
    pub unique_holders: u64,
    /// Block timestamp of the most recently processed event of either kind.
    pub last_update_at: u64,
}

impl TokenStats {
    pub fn new() -> Self {
        Self {
            id: TOKEN_STATS_ID.to_string(),
            total_supply: I256::ZERO,
            total_transfers: 0,
            total_data_updates: 0,
            unique_holders: 0,
            last_update_at: 0,
        }
    }
}

impl Default for TokenStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── DailyStats ─────────────────────────────────────────────────────────────

/// Per-day rollup, keyed by the bucket's start timestamp rendered as a
/// decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStats {
    pub id: String,
    /// ISO calendar date (`YYYY-MM-DD`), derived once at creation.
    pub date: String,
    pub transfer_count: u64,
    pub data_update_count: u64,
    /// Reserved. Neither handler populates this today.
    pub unique_users: u64,
    /// Sum of transfer values within the bucket.
    pub volume: U256,
}

impl DailyStats {
    /// Zero-valued bucket with a pre-derived date string.
    pub fn new(id: String, date: String) -> Self {
        Self {
            id,
            date,
            transfer_count: 0,
            data_update_count: 0,
            unique_users: 0,
            volume: U256::ZERO,
        }
    }
}

// ─── Transfer ───────────────────────────────────────────────────────────────

/// Immutable record of one transfer event, keyed by `txHash-logIndex`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    /// Sender account id.
    pub from: String,
    pub from_address: String,
    /// Receiver account id.
    pub to: String,
    pub to_address: String,
    pub value: U256,
    /// Block timestamp.
    pub timestamp: u64,
    pub block_number: u64,
    pub transaction_hash: String,
}

// ─── DataUpdate ─────────────────────────────────────────────────────────────

/// Immutable record of one data-update event, keyed by `txHash-logIndex`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataUpdate {
    pub id: String,
    /// Issuing account id.
    pub user: String,
    pub user_address: String,
    pub token_id: U256,
    /// Opaque application payload.
    pub data: String,
    /// Event-supplied timestamp. The emitting contract sets this itself, so
    /// it need not equal the block timestamp.
    pub timestamp: u64,
    pub block_number: u64,
    pub transaction_hash: String,
}
