use alloy::primitives::{Address, I256, U256};

use tokenscope_storage::EntityStore;
use tokenscope_storage::models::{DataUpdate, Transfer};

use crate::accessor::{
    account_id, get_or_create_account, get_or_create_daily_stats, get_or_create_token_stats,
};
use crate::error::EngineError;
use crate::event::{DataUpdateEvent, TransferEvent};

fn signed(value: U256) -> Result<I256, EngineError> {
    I256::try_from(value).map_err(|_| EngineError::Malformed("value exceeds signed range"))
}

/// Apply one transfer event: adjust both parties, append the immutable
/// record, then roll the day bucket and the global stats forward.
///
/// The sender and receiver are always resolved, zero address included, to
/// keep `last_seen_at` bookkeeping uniform; only non-zero parties take
/// balance and counter deltas. TokenStats is written last, after every
/// other write of the event has succeeded.
pub async fn handle_transfer<S: EntityStore>(
    store: &S,
    ev: &TransferEvent,
) -> Result<(), EngineError> {
    let ts = ev.meta.block_timestamp;
    let value = ev.value;
    let delta = signed(value)?;

    let (from_id, to_id) = if ev.from == ev.to {
        // Self-transfer: both sides of the event land on one fetched
        // instance, persisted once.
        let mut account = get_or_create_account(store, &ev.from, ts).await?;
        if ev.from != Address::ZERO {
            account.total_sent += value;
            account.total_received += value;
            account.transfer_count += 2;
            store.save_account(&account).await?;
        }
        (account.id.clone(), account.id)
    } else {
        let mut sender = get_or_create_account(store, &ev.from, ts).await?;
        if ev.from != Address::ZERO {
            sender.balance -= delta;
            sender.total_sent += value;
            sender.transfer_count += 1;
            store.save_account(&sender).await?;
        }

        let mut receiver = get_or_create_account(store, &ev.to, ts).await?;
        if ev.to != Address::ZERO {
            receiver.balance += delta;
            receiver.total_received += value;
            receiver.transfer_count += 1;
            store.save_account(&receiver).await?;
        }
        (sender.id, receiver.id)
    };

    let record = Transfer {
        id: ev.meta.event_id(),
        from: from_id,
        from_address: account_id(&ev.from),
        to: to_id,
        to_address: account_id(&ev.to),
        value,
        timestamp: ts,
        block_number: ev.meta.block_number,
        transaction_hash: ev.meta.tx_hash(),
    };
    store.save_transfer(&record).await?;

    let mut daily = get_or_create_daily_stats(store, ts).await?;
    daily.transfer_count += 1;
    daily.volume += value;
    store.save_daily_stats(&daily).await?;

    let mut stats = get_or_create_token_stats(store).await?;
    stats.total_transfers += 1;
    if ev.from == Address::ZERO {
        stats.total_supply += delta;
    }
    if ev.to == Address::ZERO {
        stats.total_supply -= delta;
    }
    stats.last_update_at = ts;
    store.save_token_stats(&stats).await?;

    tracing::debug!(id = %record.id, value = %value, "transfer applied");
    Ok(())
}

/// Apply one data-update event.
///
/// The stored record carries the event-supplied timestamp; day bucketing
/// and `last_update_at` use the block timestamp, which may differ.
pub async fn handle_data_update<S: EntityStore>(
    store: &S,
    ev: &DataUpdateEvent,
) -> Result<(), EngineError> {
    let ts = ev.meta.block_timestamp;

    let mut account = get_or_create_account(store, &ev.user, ts).await?;
    account.data_update_count += 1;
    store.save_account(&account).await?;

    let record = DataUpdate {
        id: ev.meta.event_id(),
        user: account.id,
        user_address: account_id(&ev.user),
        token_id: ev.token_id,
        data: ev.data.clone(),
        timestamp: ev.event_timestamp,
        block_number: ev.meta.block_number,
        transaction_hash: ev.meta.tx_hash(),
    };
    store.save_data_update(&record).await?;

    let mut daily = get_or_create_daily_stats(store, ts).await?;
    daily.data_update_count += 1;
    store.save_daily_stats(&daily).await?;

    let mut stats = get_or_create_token_stats(store).await?;
    stats.total_data_updates += 1;
    stats.last_update_at = ts;
    store.save_token_stats(&stats).await?;

    tracing::debug!(id = %record.id, "data update applied");
    Ok(())
}
