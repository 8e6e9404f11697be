use thiserror::Error;
use tokenscope_storage::StoreError;

/// Errors surfaced to the dispatcher's caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The event failed structural validation; nothing was written.
    #[error("malformed event: {0}")]
    Malformed(&'static str),

    /// The store failed mid-event; the caller must retry the event in full.
    #[error(transparent)]
    Store(#[from] StoreError),
}
