use alloy::primitives::B256;

use tokenscope_storage::EntityStore;

use crate::error::EngineError;
use crate::event::Event;
use crate::handlers::{handle_data_update, handle_transfer};

/// Routes events to their handlers, strictly one at a time.
///
/// `dispatch` takes `&mut self`, so a second event cannot enter while one is
/// in flight: the dispatcher is either idle or processing, and it returns to
/// idle only once every write of the current event is durable. The
/// cross-entity aggregates depend on that ordering.
///
/// Duplicate delivery is not detected here. Replaying an already-processed
/// event re-increments every counter it touches; deduplication belongs to
/// the event source feeding this type.
pub struct Dispatcher<S> {
    store: S,
}

impl<S: EntityStore> Dispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one event to completion. On error nothing further of the event
    /// has been applied; the caller must retry it in full from the same
    /// input, or halt the stream.
    pub async fn dispatch(&mut self, event: &Event) -> Result<(), EngineError> {
        validate(event)?;
        match event {
            Event::Transfer(ev) => handle_transfer(&self.store, ev).await,
            Event::DataUpdate(ev) => handle_data_update(&self.store, ev).await,
        }
    }
}

/// Structural checks that must pass before any entity is touched.
fn validate(event: &Event) -> Result<(), EngineError> {
    let meta = event.meta();
    if meta.transaction_hash == B256::ZERO {
        return Err(EngineError::Malformed("missing transaction hash"));
    }
    if meta.block_timestamp == 0 {
        return Err(EngineError::Malformed("missing block timestamp"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventMeta, TransferEvent};
    use alloy::primitives::{Address, U256};
    use tokenscope_storage::{EntityStore, MemoryStore};
    use tokenscope_storage::models::TOKEN_STATS_ID;

    fn transfer(tx_hash: B256, timestamp: u64) -> Event {
        Event::Transfer(TransferEvent {
            from: Address::repeat_byte(0x11),
            to: Address::repeat_byte(0x22),
            value: U256::from(10),
            meta: EventMeta {
                block_number: 1,
                block_timestamp: timestamp,
                transaction_hash: tx_hash,
                log_index: 0,
            },
        })
    }

    #[tokio::test]
    async fn rejects_missing_transaction_hash_before_any_write() {
        let mut dispatcher = Dispatcher::new(MemoryStore::new());

        let err = dispatcher
            .dispatch(&transfer(B256::ZERO, 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Malformed(_)));

        let store = dispatcher.store();
        assert_eq!(store.account_records().await, 0);
        assert!(store.load_token_stats(TOKEN_STATS_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_missing_block_timestamp() {
        let mut dispatcher = Dispatcher::new(MemoryStore::new());

        let err = dispatcher
            .dispatch(&transfer(B256::repeat_byte(0xcc), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Malformed(_)));
        assert_eq!(dispatcher.store().account_records().await, 0);
    }

    #[tokio::test]
    async fn dispatches_valid_transfer() {
        let mut dispatcher = Dispatcher::new(MemoryStore::new());

        dispatcher
            .dispatch(&transfer(B256::repeat_byte(0xcc), 1_000))
            .await
            .unwrap();

        let stats = dispatcher
            .store()
            .load_token_stats(TOKEN_STATS_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.total_transfers, 1);
    }
}
