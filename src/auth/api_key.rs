use std::sync::Arc;

use axum::http::HeaderMap;

use crate::models::user::User;
use crate::store::{StoreError, UserStore};

/// Header carrying the bearer key for the chat endpoint.
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("API key required")]
    Missing,
    #[error("Invalid API key")]
    Invalid,
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// Resolves a presented API key to a user record.
///
/// Identity only: expiry and quota are the enforcer's concern, so the same
/// user record can be rejected later for either without confusing the two
/// failure classes.
pub struct KeyAuthenticator {
    store: Arc<UserStore>,
}

impl KeyAuthenticator {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    /// Look up the `X-API-Key` header. Read-only, no side effects.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|key| !key.is_empty())
            .ok_or(AuthError::Missing)?;

        self.store.find_by_api_key(key)?.ok_or(AuthError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Plan;

    fn authenticator_with_user() -> (KeyAuthenticator, User) {
        let store = Arc::new(UserStore::new(":memory:").unwrap());
        let user = store
            .create_user("Ama Serwaa", "ama@example.com", "hash", Plan::Free)
            .unwrap();
        (KeyAuthenticator::new(store), user)
    }

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key.parse().unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let (authenticator, _) = authenticator_with_user();
        let err = authenticator.authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::Missing));
    }

    #[test]
    fn empty_header_is_rejected_as_missing() {
        let (authenticator, _) = authenticator_with_user();
        let err = authenticator
            .authenticate(&headers_with_key(""))
            .unwrap_err();
        assert!(matches!(err, AuthError::Missing));
    }

    #[test]
    fn unknown_key_is_invalid() {
        let (authenticator, _) = authenticator_with_user();
        let err = authenticator
            .authenticate(&headers_with_key("deadbeefdeadbeefdeadbeefdeadbeef"))
            .unwrap_err();
        assert!(matches!(err, AuthError::Invalid));
    }

    #[test]
    fn valid_key_resolves_the_user() {
        let (authenticator, user) = authenticator_with_user();
        let resolved = authenticator
            .authenticate(&headers_with_key(&user.api_key))
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "ama@example.com");
    }

    #[test]
    fn authentication_never_mutates_state() {
        let (authenticator, user) = authenticator_with_user();
        let headers = headers_with_key(&user.api_key);

        for _ in 0..5 {
            authenticator.authenticate(&headers).unwrap();
        }

        let resolved = authenticator.authenticate(&headers).unwrap();
        assert_eq!(resolved.requests_used, 0);
        assert_eq!(resolved.expires_at, user.expires_at);
    }
}
