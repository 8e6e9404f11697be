//! End-to-end aggregation behavior over an in-memory store.

use alloy::primitives::{Address, B256, I256, U256};

use tokenscope_engine::accessor::account_id;
use tokenscope_engine::{DataUpdateEvent, Dispatcher, Event, EventMeta, TransferEvent};
use tokenscope_storage::models::TOKEN_STATS_ID;
use tokenscope_storage::{EntityStore, MemoryStore};

const ALICE: Address = Address::repeat_byte(0xaa);
const BOB: Address = Address::repeat_byte(0xbb);
const CAROL: Address = Address::repeat_byte(0xcc);

const DAY0: u64 = 1_699_920_000; // 2023-11-14T00:00:00Z
const DAY1: u64 = DAY0 + 86_400;

fn meta(seq: u8, timestamp: u64) -> EventMeta {
    EventMeta {
        block_number: seq as u64,
        block_timestamp: timestamp,
        transaction_hash: B256::repeat_byte(seq),
        log_index: 0,
    }
}

fn transfer(from: Address, to: Address, value: u64, seq: u8, timestamp: u64) -> Event {
    Event::Transfer(TransferEvent {
        from,
        to,
        value: U256::from(value),
        meta: meta(seq, timestamp),
    })
}

fn mint(to: Address, value: u64, seq: u8, timestamp: u64) -> Event {
    transfer(Address::ZERO, to, value, seq, timestamp)
}

fn burn(from: Address, value: u64, seq: u8, timestamp: u64) -> Event {
    transfer(from, Address::ZERO, value, seq, timestamp)
}

fn data_update(user: Address, token_id: u64, data: &str, seq: u8, timestamp: u64) -> Event {
    Event::DataUpdate(DataUpdateEvent {
        user,
        token_id: U256::from(token_id),
        data: data.to_string(),
        event_timestamp: timestamp,
        meta: meta(seq, timestamp),
    })
}

#[tokio::test]
async fn transfers_between_holders_conserve_supply() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 1_000, 1, DAY0 + 10)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 400, 2, DAY0 + 20)).await.unwrap();
    dispatcher.dispatch(&transfer(BOB, CAROL, 150, 3, DAY0 + 30)).await.unwrap();
    dispatcher.dispatch(&transfer(CAROL, ALICE, 150, 4, DAY0 + 40)).await.unwrap();

    let stats = dispatcher
        .store()
        .load_token_stats(TOKEN_STATS_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_supply, I256::try_from(1_000).unwrap());
    assert_eq!(stats.total_transfers, 4);
}

#[tokio::test]
async fn mint_and_burn_move_supply_by_value() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 1_000, 1, DAY0 + 10)).await.unwrap();
    dispatcher.dispatch(&burn(ALICE, 400, 2, DAY0 + 20)).await.unwrap();

    let stats = dispatcher
        .store()
        .load_token_stats(TOKEN_STATS_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_supply, I256::try_from(600).unwrap());

    // The sentinel is stored but takes no balance deltas.
    let zero = dispatcher
        .store()
        .load_account(&account_id(&Address::ZERO))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(zero.balance, I256::ZERO);
    assert_eq!(zero.transfer_count, 0);
}

#[tokio::test]
async fn event_counts_track_processed_events() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    for seq in 1..=5u8 {
        dispatcher
            .dispatch(&transfer(ALICE, BOB, 10, seq, DAY0 + seq as u64))
            .await
            .unwrap();
    }
    for seq in 6..=8u8 {
        dispatcher
            .dispatch(&data_update(ALICE, 1, "x", seq, DAY0 + seq as u64))
            .await
            .unwrap();
    }

    let stats = dispatcher
        .store()
        .load_token_stats(TOKEN_STATS_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_transfers, 5);
    assert_eq!(stats.total_data_updates, 3);
    assert_eq!(stats.last_update_at, DAY0 + 8);
}

#[tokio::test]
async fn unique_holders_counts_distinct_nonzero_addresses() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 500, 1, DAY0 + 1)).await.unwrap();
    assert_eq!(holders(&dispatcher).await, 1);

    dispatcher.dispatch(&transfer(ALICE, BOB, 100, 2, DAY0 + 2)).await.unwrap();
    assert_eq!(holders(&dispatcher).await, 2);

    dispatcher.dispatch(&data_update(CAROL, 7, "hello", 3, DAY0 + 3)).await.unwrap();
    assert_eq!(holders(&dispatcher).await, 3);

    // Repeat appearances and the burn sentinel add nothing.
    dispatcher.dispatch(&transfer(BOB, ALICE, 50, 4, DAY0 + 4)).await.unwrap();
    dispatcher.dispatch(&burn(ALICE, 10, 5, DAY0 + 5)).await.unwrap();
    assert_eq!(holders(&dispatcher).await, 3);
}

async fn holders(dispatcher: &Dispatcher<MemoryStore>) -> u64 {
    dispatcher
        .store()
        .load_token_stats(TOKEN_STATS_ID)
        .await
        .unwrap()
        .unwrap()
        .unique_holders
}

#[tokio::test]
async fn balance_matches_received_minus_sent() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 1_000, 1, DAY0 + 1)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 300, 2, DAY0 + 2)).await.unwrap();
    dispatcher.dispatch(&transfer(BOB, ALICE, 120, 3, DAY0 + 3)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 5, 4, DAY0 + 4)).await.unwrap();

    for address in [ALICE, BOB] {
        let account = dispatcher
            .store()
            .load_account(&account_id(&address))
            .await
            .unwrap()
            .unwrap();
        let received = I256::try_from(account.total_received).unwrap();
        let sent = I256::try_from(account.total_sent).unwrap();
        assert_eq!(account.balance, received - sent, "account {}", account.id);
    }
}

#[tokio::test]
async fn day_buckets_partition_volume() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 10_000, 1, DAY0 + 100)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 30, 2, DAY0 + 200)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 70, 3, DAY0 + 86_399)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 11, 4, DAY1)).await.unwrap();
    dispatcher.dispatch(&data_update(BOB, 1, "d", 5, DAY1 + 50)).await.unwrap();

    let store = dispatcher.store();

    let day0 = store
        .load_daily_stats(&DAY0.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(day0.date, "2023-11-14");
    assert_eq!(day0.transfer_count, 3);
    assert_eq!(day0.data_update_count, 0);
    assert_eq!(day0.volume, U256::from(10_000 + 30 + 70));

    let day1 = store
        .load_daily_stats(&DAY1.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(day1.date, "2023-11-15");
    assert_eq!(day1.transfer_count, 1);
    assert_eq!(day1.data_update_count, 1);
    assert_eq!(day1.volume, U256::from(11));

    // The reserved per-day user counter stays at zero.
    assert_eq!(day0.unique_users, 0);
    assert_eq!(day1.unique_users, 0);
}

#[tokio::test]
async fn mint_then_transfer_scenario() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 1_000, 1, DAY0 + 10)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, BOB, 300, 2, DAY0 + 20)).await.unwrap();

    let store = dispatcher.store();

    let stats = store.load_token_stats(TOKEN_STATS_ID).await.unwrap().unwrap();
    assert_eq!(stats.total_supply, I256::try_from(1_000).unwrap());
    assert_eq!(stats.unique_holders, 2);
    assert_eq!(stats.total_transfers, 2);

    let alice = store.load_account(&account_id(&ALICE)).await.unwrap().unwrap();
    assert_eq!(alice.balance, I256::try_from(700).unwrap());
    assert_eq!(alice.total_received, U256::from(1_000));
    assert_eq!(alice.total_sent, U256::from(300));

    let bob = store.load_account(&account_id(&BOB)).await.unwrap().unwrap();
    assert_eq!(bob.balance, I256::try_from(300).unwrap());

    // Both records exist under their composite ids.
    let id1 = format!("{:#x}-0", B256::repeat_byte(1));
    let id2 = format!("{:#x}-0", B256::repeat_byte(2));
    assert!(store.load_transfer(&id1).await.unwrap().is_some());
    assert!(store.load_transfer(&id2).await.unwrap().is_some());
}

#[tokio::test]
async fn repeated_data_updates_accumulate() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&data_update(ALICE, 1, "x", 1, DAY0 + 1)).await.unwrap();
    dispatcher.dispatch(&data_update(ALICE, 1, "x", 2, DAY0 + 2)).await.unwrap();

    let store = dispatcher.store();

    let alice = store.load_account(&account_id(&ALICE)).await.unwrap().unwrap();
    assert_eq!(alice.data_update_count, 2);

    let stats = store.load_token_stats(TOKEN_STATS_ID).await.unwrap().unwrap();
    assert_eq!(stats.total_data_updates, 2);

    assert_eq!(store.data_update_records().await, 2);
}

#[tokio::test]
async fn data_update_record_keeps_event_supplied_timestamp() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    // The contract stamps its own clock; here it disagrees with block time.
    let event = Event::DataUpdate(DataUpdateEvent {
        user: ALICE,
        token_id: U256::from(9),
        data: "payload".to_string(),
        event_timestamp: DAY0 + 7,
        meta: meta(1, DAY1 + 500),
    });
    dispatcher.dispatch(&event).await.unwrap();

    let store = dispatcher.store();
    let id = format!("{:#x}-0", B256::repeat_byte(1));
    let record = store.load_data_update(&id).await.unwrap().unwrap();
    assert_eq!(record.timestamp, DAY0 + 7);

    // Aggregates follow block time instead.
    let stats = store.load_token_stats(TOKEN_STATS_ID).await.unwrap().unwrap();
    assert_eq!(stats.last_update_at, DAY1 + 500);
    assert!(store.load_daily_stats(&DAY1.to_string()).await.unwrap().is_some());
}

#[tokio::test]
async fn replaying_an_event_double_counts() {
    // Aggregate counters are deliberately not idempotent under replay: the
    // record upsert is a no-op, the counters are not. Deduplication is the
    // event source's responsibility.
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    let event = mint(ALICE, 100, 1, DAY0 + 1);
    dispatcher.dispatch(&event).await.unwrap();
    dispatcher.dispatch(&event).await.unwrap();

    let store = dispatcher.store();
    let stats = store.load_token_stats(TOKEN_STATS_ID).await.unwrap().unwrap();
    assert_eq!(stats.total_transfers, 2);
    assert_eq!(stats.total_supply, I256::try_from(200).unwrap());

    let alice = store.load_account(&account_id(&ALICE)).await.unwrap().unwrap();
    assert_eq!(alice.balance, I256::try_from(200).unwrap());

    // One record: same composite id both times.
    assert_eq!(store.transfer_records().await, 1);
}

#[tokio::test]
async fn self_transfer_applies_both_sides_to_one_instance() {
    let mut dispatcher = Dispatcher::new(MemoryStore::new());

    dispatcher.dispatch(&mint(ALICE, 500, 1, DAY0 + 1)).await.unwrap();
    dispatcher.dispatch(&transfer(ALICE, ALICE, 200, 2, DAY0 + 2)).await.unwrap();

    let store = dispatcher.store();
    let alice = store.load_account(&account_id(&ALICE)).await.unwrap().unwrap();

    // A lost update would show up as a skewed balance or a dropped side.
    assert_eq!(alice.balance, I256::try_from(500).unwrap());
    assert_eq!(alice.total_sent, U256::from(200));
    assert_eq!(alice.total_received, U256::from(200 + 500));
    assert_eq!(alice.transfer_count, 3);

    let stats = store.load_token_stats(TOKEN_STATS_ID).await.unwrap().unwrap();
    assert_eq!(stats.total_supply, I256::try_from(500).unwrap());
    assert_eq!(stats.total_transfers, 2);
}
