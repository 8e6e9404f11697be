use alloy::primitives::{Address, B256, U256};

/// Provenance shared by every event kind; enough to key and order one
/// occurrence.
#[derive(Debug, Clone)]
pub struct EventMeta {
    pub block_number: u64,
    /// Block timestamp in seconds.
    pub block_timestamp: u64,
    pub transaction_hash: B256,
    pub log_index: u64,
}

impl EventMeta {
    /// Composite event id, unique even for multiple events in one
    /// transaction: `txHash-logIndex`.
    pub fn event_id(&self) -> String {
        format!("{:#x}-{}", self.transaction_hash, self.log_index)
    }

    /// Lowercase hex transaction hash.
    pub fn tx_hash(&self) -> String {
        format!("{:#x}", self.transaction_hash)
    }
}

/// A token movement between two addresses.
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub meta: EventMeta,
}

/// A per-token data update issued by an account.
#[derive(Debug, Clone)]
pub struct DataUpdateEvent {
    pub user: Address,
    pub token_id: U256,
    /// Opaque application payload.
    pub data: String,
    /// Timestamp the emitting contract chose; independent of block time.
    pub event_timestamp: u64,
    pub meta: EventMeta,
}

/// One log event in canonical stream order.
#[derive(Debug, Clone)]
pub enum Event {
    Transfer(TransferEvent),
    DataUpdate(DataUpdateEvent),
}

impl Event {
    pub fn meta(&self) -> &EventMeta {
        match self {
            Event::Transfer(ev) => &ev.meta,
            Event::DataUpdate(ev) => &ev.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_combines_hash_and_log_index() {
        let meta = EventMeta {
            block_number: 10,
            block_timestamp: 1_700_000_000,
            transaction_hash: B256::repeat_byte(0xab),
            log_index: 3,
        };

        let id = meta.event_id();
        assert!(id.starts_with("0xabab"));
        assert!(id.ends_with("-3"));
        assert_eq!(id.len(), 2 + 64 + 2);
    }
}
