//! The authorization guard — the single chokepoint for tenant isolation.
//!
//! Every entry point resolves its `Principal` here and checks it against
//! the family/user scope the request names, before any message data is
//! touched. Checks fail closed: a scope mismatch is `Forbidden` with no
//! detail about which part failed.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use laxbot_core::{AuthError, Error, ItemKey, KeyValueStore, Principal, Result, UserProfile};

use crate::token::verify_token;

/// Verifies bearer tokens and enforces scope ownership.
pub struct AuthGuard {
    secret: Vec<u8>,
    store: Arc<dyn KeyValueStore>,
}

impl AuthGuard {
    pub fn new(secret: impl Into<Vec<u8>>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            secret: secret.into(),
            store,
        }
    }

    /// Extract and verify the principal from an `Authorization` header.
    pub fn principal_from_header(&self, header: Option<&str>) -> Result<Principal> {
        let header = header.ok_or(AuthError::MissingCredentials)?;
        let token = header
            .trim()
            .strip_prefix("Bearer ")
            .or_else(|| header.trim().strip_prefix("bearer "))
            .ok_or(AuthError::MissingCredentials)?
            .trim();

        let claims = verify_token(token, &self.secret, Utc::now())?;
        Ok(claims.into_principal())
    }

    /// Require that the principal *is* the (family, user) the request names.
    pub fn authorize_owner(
        &self,
        principal: &Principal,
        family_id: &str,
        user_id: &str,
    ) -> Result<()> {
        if principal.family_id != family_id || principal.user_id != user_id {
            warn!(
                principal = %principal.user_id,
                "Scope mismatch on owner check"
            );
            return Err(AuthError::Forbidden.into());
        }
        Ok(())
    }

    /// Parent view: a parent may read a child's session if the child's
    /// profile item exists under the parent's own family partition.
    ///
    /// A missing profile is indistinguishable from a foreign child on
    /// purpose; both are `Forbidden`.
    pub async fn authorize_parent_view(
        &self,
        principal: &Principal,
        child_user_id: &str,
    ) -> Result<UserProfile> {
        if !principal.is_parent() {
            return Err(AuthError::Forbidden.into());
        }

        let key = ItemKey::new(&principal.family_id, child_user_id);
        let item = self.store.get(&key).await.map_err(Error::Store)?;

        match item {
            Some(item) => {
                let profile: UserProfile = serde_json::from_value(item.attributes)
                    .map_err(|e| Error::Internal(format!("malformed profile item: {e}")))?;
                Ok(profile)
            }
            None => {
                warn!(
                    parent = %principal.user_id,
                    "Parent-view target not in family"
                );
                Err(AuthError::Forbidden.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{sign_token, TokenClaims};
    use async_trait::async_trait;
    use laxbot_core::{Item, QueryPage, StoreError, UserRole};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &[u8] = b"guard-secret";

    /// Store stub: one profile item, and a counter proving whether the
    /// guard touched the store at all.
    struct StubStore {
        profile_key: ItemKey,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for StubStore {
        fn name(&self) -> &str {
            "stub"
        }
        async fn put(&self, _item: Item) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        async fn get(&self, key: &ItemKey) -> std::result::Result<Option<Item>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if *key == self.profile_key {
                Ok(Some(Item {
                    key: key.clone(),
                    attributes: serde_json::json!({
                        "username": "liam",
                        "role": "child",
                        "birth_date": "2015-03-02",
                    }),
                }))
            } else {
                Ok(None)
            }
        }
        async fn query_prefix(
            &self,
            _partition: &str,
            _prefix: &str,
            _cursor: Option<&str>,
            _limit: usize,
            _keys_only: bool,
        ) -> std::result::Result<QueryPage, StoreError> {
            Ok(QueryPage {
                items: vec![],
                next_cursor: None,
            })
        }
        async fn delete(&self, _key: &ItemKey) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        async fn delete_batch(&self, _keys: &[ItemKey]) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    fn guard_with_child_in(family: &str) -> (AuthGuard, Arc<StubStore>) {
        let store = Arc::new(StubStore {
            profile_key: ItemKey::new(family, "user#child"),
            reads: AtomicUsize::new(0),
        });
        (AuthGuard::new(SECRET, store.clone()), store)
    }

    fn bearer_for(role: UserRole, user_id: &str, family_id: &str) -> String {
        let claims = TokenClaims {
            user_id: user_id.into(),
            username: "anna".into(),
            role,
            family_id: family_id.into(),
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };
        format!("Bearer {}", sign_token(&claims, SECRET))
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let (guard, _) = guard_with_child_in("family#1");
        let err = guard.principal_from_header(None).unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::MissingCredentials)));
    }

    #[test]
    fn non_bearer_header_rejected() {
        let (guard, _) = guard_with_child_in("family#1");
        let err = guard
            .principal_from_header(Some("Basic dXNlcjpwdw=="))
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::MissingCredentials)));
    }

    #[test]
    fn valid_bearer_yields_principal() {
        let (guard, _) = guard_with_child_in("family#1");
        let header = bearer_for(UserRole::Parent, "user#1", "family#1");
        let principal = guard.principal_from_header(Some(&header)).unwrap();
        assert_eq!(principal.user_id, "user#1");
        assert_eq!(principal.family_id, "family#1");
    }

    #[test]
    fn owner_check_rejects_foreign_family_without_store_access() {
        let (guard, store) = guard_with_child_in("family#1");
        let header = bearer_for(UserRole::Child, "user#1", "family#1");
        let principal = guard.principal_from_header(Some(&header)).unwrap();

        let err = guard
            .authorize_owner(&principal, "family#2", "user#1")
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Forbidden)));
        // The isolation property: rejection happened before any store read.
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn owner_check_rejects_foreign_user() {
        let (guard, _) = guard_with_child_in("family#1");
        let header = bearer_for(UserRole::Child, "user#1", "family#1");
        let principal = guard.principal_from_header(Some(&header)).unwrap();

        assert!(guard.authorize_owner(&principal, "family#1", "user#2").is_err());
        assert!(guard.authorize_owner(&principal, "family#1", "user#1").is_ok());
    }

    #[tokio::test]
    async fn parent_view_requires_parent_role() {
        let (guard, _) = guard_with_child_in("family#1");
        let header = bearer_for(UserRole::Child, "user#1", "family#1");
        let principal = guard.principal_from_header(Some(&header)).unwrap();

        let err = guard
            .authorize_parent_view(&principal, "user#child")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn parent_view_allows_child_in_family() {
        let (guard, _) = guard_with_child_in("family#1");
        let header = bearer_for(UserRole::Parent, "user#1", "family#1");
        let principal = guard.principal_from_header(Some(&header)).unwrap();

        let profile = guard
            .authorize_parent_view(&principal, "user#child")
            .await
            .unwrap();
        assert_eq!(profile.username, "liam");
        assert_eq!(profile.role, UserRole::Child);
    }

    #[tokio::test]
    async fn parent_view_rejects_child_outside_family() {
        // Child profile lives in family#2; parent token is for family#1, so
        // the lookup under the parent's partition misses.
        let (guard, _) = guard_with_child_in("family#2");
        let header = bearer_for(UserRole::Parent, "user#1", "family#1");
        let principal = guard.principal_from_header(Some(&header)).unwrap();

        let err = guard
            .authorize_parent_view(&principal, "user#child")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Forbidden)));
    }
}
