//! Session store client and key-value backends for laxbot.
//!
//! Layering:
//! - `SqliteStore` / `InMemoryStore` implement the single-request
//!   [`laxbot_core::KeyValueStore`] trait (one page, one batch).
//! - [`SessionStore`] is the client every caller uses: it drains
//!   continuation cursors, chunks bulk deletes to the per-request limit,
//!   and speaks in chat-domain terms (messages, sessions, turns).

pub mod in_memory;
pub mod session;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use session::{SessionStore, StoredMessage};
pub use sqlite::SqliteStore;
