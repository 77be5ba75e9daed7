//! Chat message and turn domain types.
//!
//! A `ChatMessage` is the atomic stored unit: one row in the session store.
//! Messages are created in pairs, one `user` and one `assistant`, by the
//! completion orchestrator; the pair is a `Turn` and shares a `turn_id`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milliseconds between a user message and the assistant reply written for
/// it. Keeps the assistant row sorting directly after the user row; pairing
/// itself is by `turn_id`, never by timestamp arithmetic.
pub const ASSISTANT_REPLY_OFFSET_MS: i64 = 1000;

/// The role of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A single persisted chat message, scoped to (family, user, session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub family_id: String,
    pub user_id: String,
    pub session_id: String,
    pub role: Role,
    pub text: String,

    /// Message timestamp. Serialized into the sort key with a fixed-width
    /// ISO-8601 format so lexicographic order equals chronological order.
    pub timestamp: DateTime<Utc>,

    /// Shared by both messages of a turn.
    pub turn_id: Uuid,
}

/// An inline image accompanying a user message (base64 payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// e.g. "image/png"
    pub media_type: String,
    /// Base64-encoded image bytes, without a data-URL prefix.
    pub data: String,
}

impl ImageAttachment {
    /// Render as a `data:` URL for providers that inline images.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// One user message plus the assistant reply produced for it.
#[derive(Debug, Clone)]
pub struct Turn {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
}

impl Turn {
    /// Build the message pair for one completed orchestrator invocation.
    ///
    /// The assistant timestamp is offset by [`ASSISTANT_REPLY_OFFSET_MS`]
    /// so its sort key lands right after the user message.
    pub fn new(
        family_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let family_id = family_id.into();
        let user_id = user_id.into();
        let session_id = session_id.into();
        let turn_id = Uuid::new_v4();

        let user = ChatMessage {
            family_id: family_id.clone(),
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            role: Role::User,
            text: user_text.into(),
            timestamp,
            turn_id,
        };
        let assistant = ChatMessage {
            family_id,
            user_id,
            session_id,
            role: Role::Assistant,
            text: assistant_text.into(),
            timestamp: timestamp + Duration::milliseconds(ASSISTANT_REPLY_OFFSET_MS),
            turn_id,
        };

        Self { user, assistant }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_shares_id_and_offsets_assistant() {
        let now = Utc::now();
        let turn = Turn::new("family#1", "user#1", "session_a", "Hej", "Hej på dig!", now);

        assert_eq!(turn.user.turn_id, turn.assistant.turn_id);
        assert_eq!(turn.user.role, Role::User);
        assert_eq!(turn.assistant.role, Role::Assistant);
        assert_eq!(
            (turn.assistant.timestamp - turn.user.timestamp).num_milliseconds(),
            ASSISTANT_REPLY_OFFSET_MS
        );
    }

    #[test]
    fn role_roundtrip() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn image_data_url() {
        let img = ImageAttachment {
            media_type: "image/png".into(),
            data: "aGVqCg==".into(),
        };
        assert_eq!(img.to_data_url(), "data:image/png;base64,aGVqCg==");
    }
}
