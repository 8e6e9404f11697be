use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;

use crate::abi::SimpleToken;

/// Classified SimpleToken log.
#[derive(Debug, Clone)]
pub enum TokenEvent {
    Transfer {
        from: Address,
        to: Address,
        value: U256,
        block_number: u64,
        transaction_hash: B256,
        log_index: u64,
    },
    DataUpdated {
        user: Address,
        token_id: U256,
        data: String,
        /// Timestamp stamped by the contract, not the block.
        timestamp: U256,
        block_number: u64,
        transaction_hash: B256,
        log_index: u64,
    },
}

impl TokenEvent {
    pub fn block_number(&self) -> u64 {
        match self {
            TokenEvent::Transfer { block_number, .. }
            | TokenEvent::DataUpdated { block_number, .. } => *block_number,
        }
    }
}

/// Attempt to decode a log as a SimpleToken `Transfer` or `DataUpdated`
/// event. Logs for any other event return `None`, as do pending logs that
/// lack block provenance.
pub fn decode_log(log: &Log) -> Option<TokenEvent> {
    let block_number = log.block_number?;
    let transaction_hash = log.transaction_hash?;
    let log_index = log.log_index?;

    if let Ok(decoded) = log.log_decode::<SimpleToken::Transfer>() {
        let d = decoded.inner.data;
        return Some(TokenEvent::Transfer {
            from: d.from,
            to: d.to,
            value: d.value,
            block_number,
            transaction_hash,
            log_index,
        });
    }

    if let Ok(decoded) = log.log_decode::<SimpleToken::DataUpdated>() {
        let d = decoded.inner.data;
        return Some(TokenEvent::DataUpdated {
            user: d.user,
            token_id: d.tokenId,
            data: d.data,
            timestamp: d.timestamp,
            block_number,
            transaction_hash,
            log_index,
        });
    }

    None
}
