//! In-memory backend — useful for testing and ephemeral deployments.
//!
//! A BTreeMap keyed by (partition, sort) gives the same ascending
//! sort-key order the production backend provides. Request counters are
//! exposed so tests can assert *how many* underlying calls an operation
//! made (page fan-out, batch chunking), not just its end state.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use laxbot_core::{Item, ItemKey, KeyValueStore, QueryPage, StoreError, MAX_BATCH_DELETE};

/// An in-memory `KeyValueStore`.
pub struct InMemoryStore {
    items: RwLock<BTreeMap<(String, String), serde_json::Value>>,
    query_calls: AtomicUsize,
    batch_delete_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            query_calls: AtomicUsize::new(0),
            batch_delete_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `query_prefix` requests served so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of `delete_batch` requests served so far.
    pub fn batch_delete_calls(&self) -> usize {
        self.batch_delete_calls.load(Ordering::SeqCst)
    }

    /// Total stored item count (test helper).
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        self.items
            .write()
            .await
            .insert((item.key.partition, item.key.sort), item.attributes);
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        let items = self.items.read().await;
        Ok(items
            .get(&(key.partition.clone(), key.sort.clone()))
            .map(|attrs| Item {
                key: key.clone(),
                attributes: attrs.clone(),
            }))
    }

    async fn query_prefix(
        &self,
        partition: &str,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
        keys_only: bool,
    ) -> Result<QueryPage, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);

        let items = self.items.read().await;
        let mut matched: Vec<Item> = Vec::new();
        let mut more = false;

        for ((pk, sk), attrs) in items.iter() {
            if pk != partition || !sk.starts_with(prefix) {
                continue;
            }
            if let Some(after) = cursor {
                if sk.as_str() <= after {
                    continue;
                }
            }
            if matched.len() == limit {
                more = true;
                break;
            }
            matched.push(Item {
                key: ItemKey::new(pk.clone(), sk.clone()),
                attributes: if keys_only {
                    serde_json::json!({})
                } else {
                    attrs.clone()
                },
            });
        }

        let next_cursor = if more {
            matched.last().map(|item| item.key.sort.clone())
        } else {
            None
        };

        Ok(QueryPage {
            items: matched,
            next_cursor,
        })
    }

    async fn delete(&self, key: &ItemKey) -> Result<(), StoreError> {
        self.items
            .write()
            .await
            .remove(&(key.partition.clone(), key.sort.clone()));
        Ok(())
    }

    async fn delete_batch(&self, keys: &[ItemKey]) -> Result<(), StoreError> {
        if keys.len() > MAX_BATCH_DELETE {
            return Err(StoreError::BatchTooLarge {
                requested: keys.len(),
                limit: MAX_BATCH_DELETE,
            });
        }
        self.batch_delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut items = self.items.write().await;
        for key in keys {
            items.remove(&(key.partition.clone(), key.sort.clone()));
        }
        Ok(())
    }
}
