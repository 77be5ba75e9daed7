//! Principal and user profile types.
//!
//! A `Principal` is the verified identity extracted from a request token.
//! It is created at login/registration time by the account service and
//! never persisted here; the core only checks it against the family/user
//! scope a request names.

use serde::{Deserialize, Serialize};

/// Account role within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Parent,
    Child,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Parent => "parent",
            UserRole::Child => "child",
        }
    }
}

/// The verified identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
    pub family_id: String,
}

impl Principal {
    pub fn is_parent(&self) -> bool {
        self.role == UserRole::Parent
    }
}

/// The family-member profile item written at registration time
/// (partition = family id, sort = user id). The core reads it for the
/// parent-view membership check and for best-effort age personalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub role: UserRole,

    /// `YYYY-MM-DD`; absent for accounts registered without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Parent).unwrap(), "\"parent\"");
        assert_eq!(serde_json::to_string(&UserRole::Child).unwrap(), "\"child\"");
    }

    #[test]
    fn parent_check() {
        let p = Principal {
            user_id: "user#1".into(),
            username: "anna".into(),
            role: UserRole::Parent,
            family_id: "family#1".into(),
        };
        assert!(p.is_parent());
    }

    #[test]
    fn profile_tolerates_missing_birth_date() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"username":"liam","role":"child"}"#).unwrap();
        assert!(profile.birth_date.is_none());
    }
}
