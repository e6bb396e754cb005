use async_trait::async_trait;
use shared::Document;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use memory::MemoryCollection;
pub use redis::RedisCollection;

/// Errors from the document store. Never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed stored document: {0}")]
    Malformed(String),
}

/// One named collection of JSON documents, addressed by string id. This is
/// the handlers' only view of the store; implementations are injected so
/// tests can substitute their own.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Fetch a document; `Ok(None)` when the id was never written.
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write a document. With `merge`, the supplied fields fold into the
    /// existing document (created if absent); without, the document is
    /// replaced whole.
    async fn set(&self, id: &str, doc: Document, merge: bool) -> Result<(), StoreError>;

    /// Remove a document. Removing an absent id is not an error at this
    /// level; callers decide whether absence matters.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Enumerate every (id, document) pair, in store order.
    async fn all(&self) -> Result<Vec<(String, Document)>, StoreError>;

    /// Reserve a fresh document id.
    fn new_id(&self) -> String;
}
