//! KeyValueStore trait — the abstraction over the external key-value store.
//!
//! Models a partition/sort-keyed store with DynamoDB-shaped limits: paged
//! prefix queries that hand back a continuation cursor, and batch deletes
//! capped at [`MAX_BATCH_DELETE`] items per request. The session store
//! client layers pagination loops and chunking on top of this trait;
//! backends only implement single-request semantics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Per-request item limit for batch deletes, matching the store's
/// BatchWrite contract.
pub const MAX_BATCH_DELETE: usize = 25;

/// The composite address of one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub partition: String,
    pub sort: String,
}

impl ItemKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

/// One stored item: its key plus a JSON attribute map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub key: ItemKey,
    /// Non-key attributes. Always a JSON object; empty for keys-only reads.
    pub attributes: serde_json::Value,
}

/// One page of a prefix query.
#[derive(Debug, Clone)]
pub struct QueryPage {
    /// Items in ascending sort-key order.
    pub items: Vec<Item>,
    /// Present when the store has more matching items; pass back as the
    /// `cursor` of the next request.
    pub next_cursor: Option<String>,
}

/// The store backend trait.
///
/// Implementations: SQLite (production), in-memory (tests). All methods are
/// single requests: no looping, no chunking; that policy belongs to the
/// session store client so it is identical across backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The backend name (e.g. "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Write one item, overwriting any existing item at the same key.
    async fn put(&self, item: Item) -> Result<(), StoreError>;

    /// Point read. `Ok(None)` when absent.
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError>;

    /// Read one page of items whose sort key starts with `prefix`, in
    /// ascending sort-key order, resuming after `cursor` when given.
    /// At most `limit` items per page. `keys_only` skips attribute payloads.
    async fn query_prefix(
        &self,
        partition: &str,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
        keys_only: bool,
    ) -> Result<QueryPage, StoreError>;

    /// Delete one item. Succeeds whether or not the item existed.
    async fn delete(&self, key: &ItemKey) -> Result<(), StoreError>;

    /// Delete up to [`MAX_BATCH_DELETE`] items in one request. Backends must
    /// reject larger batches with [`StoreError::BatchTooLarge`].
    async fn delete_batch(&self, keys: &[ItemKey]) -> Result<(), StoreError>;
}
