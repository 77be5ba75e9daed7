//! The session store client — every read and write of chat data goes
//! through here.
//!
//! Responsibilities on top of the raw `KeyValueStore`:
//! - follow continuation cursors until the backend reports no further
//!   pages (an interrupted pagination loop is a correctness bug),
//! - chunk bulk deletes to the backend's 25-item batch limit,
//! - translate between chat-domain types and pk/sk items,
//! - pair turn deletion by `turn_id` instead of timestamp arithmetic.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use laxbot_core::keys;
use laxbot_core::{
    ChatMessage, Error, Item, ItemKey, KeyValueStore, Result, Role, Turn, UserProfile,
    MAX_BATCH_DELETE,
};

/// A message as read back from the store: the attribute payload plus the
/// timestamp text recovered from the sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub role: Role,
    pub text: String,
    /// The sort-key timestamp, verbatim; callers echo it back for
    /// single-turn deletion.
    pub timestamp: String,
    pub turn_id: Uuid,
}

/// The session store client.
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    page_size: usize,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, page_size: usize) -> Self {
        Self { kv, page_size }
    }

    fn message_item(message: &ChatMessage) -> Item {
        Item {
            key: ItemKey::new(
                keys::partition_key(&message.family_id),
                keys::message_sort_key(&message.user_id, &message.session_id, message.timestamp),
            ),
            attributes: serde_json::json!({
                "role": message.role.as_str(),
                "text": message.text,
                "turn_id": message.turn_id,
            }),
        }
    }

    fn parse_message_item(item: &Item) -> Result<StoredMessage> {
        let (_, _, timestamp) = keys::split_sort_key(&item.key.sort)
            .ok_or_else(|| Error::Internal(format!("malformed sort key: {}", item.key.sort)))?;

        let role: Role = item.attributes["role"]
            .as_str()
            .unwrap_or_default()
            .parse()
            .map_err(|e| Error::Internal(format!("malformed message item: {e}")))?;
        let text = item.attributes["text"].as_str().unwrap_or_default().to_string();
        let turn_id = item.attributes["turn_id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| Error::Internal("message item missing turn_id".into()))?;

        Ok(StoredMessage {
            role,
            text,
            timestamp: timestamp.to_string(),
            turn_id,
        })
    }

    /// Drain every page for a prefix. Any backend error aborts the whole
    /// read; partial results are never returned.
    async fn collect_prefix(
        &self,
        partition: &str,
        prefix: &str,
        keys_only: bool,
    ) -> Result<Vec<Item>> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .kv
                .query_prefix(partition, prefix, cursor.as_deref(), self.page_size, keys_only)
                .await?;
            all.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(all)
    }

    /// Write one message. Key collisions overwrite; callers ensure
    /// distinct timestamps within a session.
    pub async fn put_message(&self, message: &ChatMessage) -> Result<()> {
        self.kv.put(Self::message_item(message)).await?;
        Ok(())
    }

    /// Persist both messages of a completed turn, user first.
    pub async fn put_turn(&self, turn: &Turn) -> Result<()> {
        self.put_message(&turn.user).await?;
        self.put_message(&turn.assistant).await?;
        Ok(())
    }

    /// All messages in one session, ascending by time.
    #[instrument(skip(self))]
    pub async fn session_messages(
        &self,
        family_id: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<StoredMessage>> {
        let partition = keys::partition_key(family_id);
        let prefix = keys::session_prefix(user_id, session_id);

        let items = self.collect_prefix(&partition, &prefix, false).await?;
        items.iter().map(Self::parse_message_item).collect()
    }

    /// Distinct session ids for a user, in chronological first-message
    /// order. Keys-only read over the user prefix.
    pub async fn list_sessions(&self, family_id: &str, user_id: &str) -> Result<Vec<String>> {
        let partition = keys::partition_key(family_id);
        let prefix = keys::user_prefix(user_id);

        let items = self.collect_prefix(&partition, &prefix, true).await?;
        let mut sessions: Vec<String> = Vec::new();
        for item in &items {
            if let Some((_, session_id, _)) = keys::split_sort_key(&item.key.sort) {
                if !sessions.iter().any(|s| s == session_id) {
                    sessions.push(session_id.to_string());
                }
            }
        }
        Ok(sessions)
    }

    /// Delete every message in a session. Materializes the full key list
    /// first (keys-only pagination), then deletes in batches bounded by
    /// the store's per-request limit. Returns the number deleted.
    ///
    /// An empty prefix is `Error::NotFound`, not zero; callers distinguish
    /// "nothing to delete" from "already empty".
    #[instrument(skip(self))]
    pub async fn delete_session(
        &self,
        family_id: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<usize> {
        let partition = keys::partition_key(family_id);
        let prefix = keys::session_prefix(user_id, session_id);

        let items = self.collect_prefix(&partition, &prefix, true).await?;
        if items.is_empty() {
            return Err(Error::NotFound(format!("session {session_id}")));
        }

        let keys: Vec<ItemKey> = items.into_iter().map(|item| item.key).collect();
        for chunk in keys.chunks(MAX_BATCH_DELETE) {
            self.kv.delete_batch(chunk).await?;
        }

        debug!(count = keys.len(), "Deleted session");
        Ok(keys.len())
    }

    /// Delete one turn, anchored at the user message's sort-key timestamp.
    ///
    /// The anchor is point-read to recover its `turn_id`; every message in
    /// the session sharing that id is deleted (1 or 2 rows). A missing
    /// anchor is `Error::NotFound`.
    #[instrument(skip(self))]
    pub async fn delete_turn(
        &self,
        family_id: &str,
        user_id: &str,
        session_id: &str,
        timestamp: &str,
    ) -> Result<usize> {
        let partition = keys::partition_key(family_id);
        let prefix = keys::session_prefix(user_id, session_id);
        let anchor_key = ItemKey::new(&partition, format!("{prefix}{timestamp}"));

        let anchor = self
            .kv
            .get(&anchor_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message at {timestamp}")))?;
        let turn_id = Self::parse_message_item(&anchor)?.turn_id;

        let items = self.collect_prefix(&partition, &prefix, false).await?;
        let keys: Vec<ItemKey> = items
            .into_iter()
            .filter(|item| {
                Self::parse_message_item(item)
                    .map(|m| m.turn_id == turn_id)
                    .unwrap_or(false)
            })
            .map(|item| item.key)
            .collect();

        for chunk in keys.chunks(MAX_BATCH_DELETE) {
            self.kv.delete_batch(chunk).await?;
        }

        debug!(count = keys.len(), %turn_id, "Deleted turn");
        Ok(keys.len())
    }

    /// Point-read a family member's profile item. `Ok(None)` when the
    /// member has no profile (best-effort callers proceed without it).
    pub async fn get_profile(&self, family_id: &str, user_id: &str) -> Result<Option<UserProfile>> {
        let key = ItemKey::new(keys::partition_key(family_id), user_id);
        match self.kv.get(&key).await? {
            Some(item) => {
                let profile = serde_json::from_value(item.attributes)
                    .map_err(|e| Error::Internal(format!("malformed profile item: {e}")))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Write a family member's profile item (registration-side seeding).
    pub async fn put_profile(
        &self,
        family_id: &str,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<()> {
        let item = Item {
            key: ItemKey::new(keys::partition_key(family_id), user_id),
            attributes: serde_json::to_value(profile)?,
        };
        self.kv.put(item).await?;
        Ok(())
    }
}
