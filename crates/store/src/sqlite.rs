//! SQLite backend for the key-value store.
//!
//! A single `items` table with a composite (pk, sk) primary key models the
//! partition/sort layout. Prefix queries use `LIKE` with an escaped
//! pattern so `%`/`_` inside identifiers cannot widen a match, and rely on
//! SQLite's BINARY collation for the lexicographic = chronological
//! ordering guarantee of the key scheme.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use laxbot_core::{Item, ItemKey, KeyValueStore, QueryPage, StoreError, MAX_BATCH_DELETE};

/// The production SQLite `KeyValueStore`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    /// Pass `"sqlite::memory:"` for an ephemeral database in tests.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite session store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                pk    TEXT NOT NULL,
                sk    TEXT NOT NULL,
                attrs TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (pk, sk)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("items table: {e}")))?;
        Ok(())
    }

    /// Escape `LIKE` metacharacters so the prefix matches literally.
    fn escape_like(prefix: &str) -> String {
        let mut escaped = String::with_capacity(prefix.len() + 4);
        for c in prefix.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        let attrs = serde_json::to_string(&item.attributes)
            .map_err(|e| StoreError::Storage(format!("attrs serialize: {e}")))?;

        sqlx::query("INSERT OR REPLACE INTO items (pk, sk, attrs) VALUES (?, ?, ?)")
            .bind(&item.key.partition)
            .bind(&item.key.sort)
            .bind(&attrs)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("put: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query("SELECT attrs FROM items WHERE pk = ? AND sk = ?")
            .bind(&key.partition)
            .bind(&key.sort)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("get: {e}")))?;

        row.map(|row| {
            let attrs: String = row.get("attrs");
            let attributes = serde_json::from_str(&attrs)
                .map_err(|e| StoreError::Storage(format!("attrs parse: {e}")))?;
            Ok(Item {
                key: key.clone(),
                attributes,
            })
        })
        .transpose()
    }

    async fn query_prefix(
        &self,
        partition: &str,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
        keys_only: bool,
    ) -> Result<QueryPage, StoreError> {
        let pattern = format!("{}%", Self::escape_like(prefix));
        let columns = if keys_only { "sk, '{}' AS attrs" } else { "sk, attrs" };

        // Fetch one extra row to learn whether a further page exists.
        let sql = format!(
            r#"
            SELECT {columns} FROM items
            WHERE pk = ? AND sk LIKE ? ESCAPE '\' AND sk > ?
            ORDER BY sk ASC
            LIMIT ?
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(partition)
            .bind(&pattern)
            .bind(cursor.unwrap_or(""))
            .bind((limit + 1) as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("query_prefix: {e}")))?;

        let more = rows.len() > limit;
        let mut items = Vec::with_capacity(rows.len().min(limit));
        for row in rows.into_iter().take(limit) {
            let sk: String = row.get("sk");
            let attrs: String = row.get("attrs");
            let attributes = serde_json::from_str(&attrs)
                .map_err(|e| StoreError::Storage(format!("attrs parse: {e}")))?;
            items.push(Item {
                key: ItemKey::new(partition, sk),
                attributes,
            });
        }

        let next_cursor = if more {
            items.last().map(|item| item.key.sort.clone())
        } else {
            None
        };

        Ok(QueryPage { items, next_cursor })
    }

    async fn delete(&self, key: &ItemKey) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM items WHERE pk = ? AND sk = ?")
            .bind(&key.partition)
            .bind(&key.sort)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("delete: {e}")))?;
        Ok(())
    }

    async fn delete_batch(&self, keys: &[ItemKey]) -> Result<(), StoreError> {
        if keys.len() > MAX_BATCH_DELETE {
            return Err(StoreError::BatchTooLarge {
                requested: keys.len(),
                limit: MAX_BATCH_DELETE,
            });
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin: {e}")))?;
        for key in keys {
            sqlx::query("DELETE FROM items WHERE pk = ? AND sk = ?")
                .bind(&key.partition)
                .bind(&key.sort)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Storage(format!("delete_batch: {e}")))?;
        }
        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn item(pk: &str, sk: &str, text: &str) -> Item {
        Item {
            key: ItemKey::new(pk, sk),
            attributes: serde_json::json!({"text": text}),
        }
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let store = test_store().await;
        store.put(item("family#1", "a", "first")).await.unwrap();
        store.put(item("family#1", "a", "second")).await.unwrap();

        let got = store
            .get(&ItemKey::new("family#1", "a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.attributes["text"], "second");
    }

    #[tokio::test]
    async fn query_prefix_pages_and_orders() {
        let store = test_store().await;
        for i in [3, 1, 4, 2, 5] {
            store
                .put(item("family#1", &format!("p#{i}"), "x"))
                .await
                .unwrap();
        }

        let page = store
            .query_prefix("family#1", "p#", None, 3, false)
            .await
            .unwrap();
        assert_eq!(
            page.items.iter().map(|i| i.key.sort.as_str()).collect::<Vec<_>>(),
            vec!["p#1", "p#2", "p#3"]
        );
        let cursor = page.next_cursor.expect("second page");

        let page2 = store
            .query_prefix("family#1", "p#", Some(&cursor), 3, false)
            .await
            .unwrap();
        assert_eq!(page2.items.len(), 2);
        assert!(page2.next_cursor.is_none());
    }

    #[tokio::test]
    async fn like_metacharacters_do_not_widen_prefix() {
        let store = test_store().await;
        // "session_1" contains '_', which is a LIKE wildcard if unescaped.
        store
            .put(item("family#1", "user#1#SESSION#session_1#MSG#t1", "a"))
            .await
            .unwrap();
        store
            .put(item("family#1", "user#1#SESSION#sessionX1#MSG#t1", "b"))
            .await
            .unwrap();

        let page = store
            .query_prefix("family#1", "user#1#SESSION#session_1#MSG#", None, 10, false)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].attributes["text"], "a");
    }

    #[tokio::test]
    async fn keys_only_returns_empty_attrs() {
        let store = test_store().await;
        store.put(item("family#1", "p#1", "secret")).await.unwrap();

        let page = store
            .query_prefix("family#1", "p#", None, 10, true)
            .await
            .unwrap();
        assert_eq!(page.items[0].attributes, serde_json::json!({}));
    }

    #[tokio::test]
    async fn batch_delete_respects_limit() {
        let store = test_store().await;
        let keys: Vec<ItemKey> = (0..30)
            .map(|i| ItemKey::new("family#1", format!("p#{i:02}")))
            .collect();
        let err = store.delete_batch(&keys).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge { .. }));

        for key in &keys[..25] {
            store
                .put(Item {
                    key: key.clone(),
                    attributes: serde_json::json!({}),
                })
                .await
                .unwrap();
        }
        store.delete_batch(&keys[..25]).await.unwrap();
        let page = store
            .query_prefix("family#1", "p#", None, 50, true)
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }
}
