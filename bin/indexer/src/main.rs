//! Tokenscope Indexer — ingests SimpleToken events from an EVM chain and
//! maintains the derived entities.
//!
//! Flow:
//! 1. Connect to the Ethereum RPC & PostgreSQL
//! 2. Poll blocks in batches, decode Transfer/DataUpdated logs
//! 3. Feed every event through the dispatcher, strictly in log order
//! 4. Advance the cursor once the whole batch is applied
//!
//! Every derived entity is a cache of facts already on the event log:
//! wiping the database and restarting from START_BLOCK rebuilds the same
//! state. The cursor advances only after a batch is fully applied, so a
//! crash replays the batch from its first event; replay across that
//! boundary can double-count aggregates, which is why the feed upstream of
//! this process must deliver finalized blocks exactly once per run.

use std::collections::HashMap;

use alloy::{
    consensus::BlockHeader,
    eips::BlockNumberOrTag,
    primitives::Address,
    providers::{DynProvider, Provider},
    rpc::types::Filter,
};
use eyre::Result;
use tokenscope_chain::{TokenEvent, decoder, provider};
use tokenscope_core::{Settings, telemetry};
use tokenscope_engine::{DataUpdateEvent, Dispatcher, Event, EventMeta, TransferEvent};
use tokenscope_storage::{self as storage, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // ── Initialisation ──────────────────────────────────────────────────
    telemetry::init();
    let settings = Settings::from_env()?;

    tracing::info!(rpc = %settings.rpc_url, "Starting Tokenscope Indexer");

    let pool = storage::connect(&settings.database_url).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let provider = provider::create_provider(&settings.rpc_url)?;
    tracing::info!("Connected to RPC");

    let token: Address = settings.token_address.parse()?;
    tracing::info!(token = %token, "Watching contract");

    let store = PgStore::new(pool);
    let mut dispatcher = Dispatcher::new(store.clone());

    // ── Main Indexing Loop ──────────────────────────────────────────────
    let mut last_block = store.last_indexed_block().await?;
    if last_block == 0 && settings.start_block > 0 {
        last_block = settings.start_block as i64 - 1;
    }

    tracing::info!(from_block = last_block + 1, "Starting indexing loop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully…");
                break;
            }
            result = index_next_batch(
                &provider,
                &store,
                &mut dispatcher,
                &mut last_block,
                token,
                settings.batch_size,
            ) => {
                match result {
                    Ok(indexed) => {
                        if !indexed {
                            // We're caught up — wait before polling again
                            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Indexing error, retrying in 5s…");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    tracing::info!("Indexer stopped.");
    Ok(())
}

/// Index the next batch of blocks. Returns `Ok(true)` if work was done,
/// `Ok(false)` if caught up.
async fn index_next_batch(
    provider: &DynProvider,
    store: &PgStore,
    dispatcher: &mut Dispatcher<PgStore>,
    last_block: &mut i64,
    token: Address,
    batch_size: u64,
) -> Result<bool> {
    let chain_head = provider.get_block_number().await? as i64;

    if *last_block >= chain_head {
        return Ok(false); // Caught up
    }

    let from = *last_block + 1;
    let to = std::cmp::min(from + batch_size as i64 - 1, chain_head);

    tracing::info!(from = from, to = to, head = chain_head, "Indexing batch");

    let filter = Filter::new()
        .address(token)
        .from_block(from as u64)
        .to_block(to as u64);

    let logs = provider.get_logs(&filter).await?;

    let mut timestamps: HashMap<u64, u64> = HashMap::new();
    let mut events = 0usize;

    for log in &logs {
        let Some(decoded) = decoder::decode_log(log) else {
            continue;
        };

        // eth_getLogs omits the block timestamp on some nodes.
        let block_timestamp = match log.block_timestamp {
            Some(ts) => ts,
            None => block_timestamp(provider, &mut timestamps, decoded.block_number()).await?,
        };

        dispatcher.dispatch(&to_event(decoded, block_timestamp)).await?;
        events += 1;
    }

    store.set_last_indexed_block(to).await?;
    *last_block = to;

    tracing::info!(block = to, events = events, "Batch complete");

    Ok(true)
}

/// Block timestamp by number, memoized for the current batch.
async fn block_timestamp(
    provider: &DynProvider,
    cache: &mut HashMap<u64, u64>,
    number: u64,
) -> Result<u64> {
    if let Some(ts) = cache.get(&number) {
        return Ok(*ts);
    }

    let block = provider
        .get_block_by_number(BlockNumberOrTag::Number(number))
        .await?
        .ok_or_else(|| eyre::eyre!("Block {} not found on chain", number))?;
    let ts = block.header.timestamp();
    cache.insert(number, ts);
    Ok(ts)
}

/// Lift a decoded log into the engine's event type.
fn to_event(decoded: TokenEvent, block_timestamp: u64) -> Event {
    match decoded {
        TokenEvent::Transfer {
            from,
            to,
            value,
            block_number,
            transaction_hash,
            log_index,
        } => Event::Transfer(TransferEvent {
            from,
            to,
            value,
            meta: EventMeta {
                block_number,
                block_timestamp,
                transaction_hash,
                log_index,
            },
        }),
        TokenEvent::DataUpdated {
            user,
            token_id,
            data,
            timestamp,
            block_number,
            transaction_hash,
            log_index,
        } => Event::DataUpdate(DataUpdateEvent {
            user,
            token_id,
            data,
            event_timestamp: timestamp.saturating_to::<u64>(),
            meta: EventMeta {
                block_number,
                block_timestamp,
                transaction_hash,
                log_index,
            },
        }),
    }
}
