//! Bearer token authentication backed by the `[auth]` config table.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::collections::HashMap;

use crate::auth::{AuthError, AuthProvider};
use crate::config::UserConfig;
use crate::notes::types::UserId;

/// Maps static bearer tokens to identities.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthProvider {
    tokens: HashMap<String, UserId>,
}

impl TokenAuthProvider {
    pub fn new(users: &[UserConfig]) -> Self {
        Self {
            tokens: users
                .iter()
                .map(|u| (u.token.clone(), UserId::from(u.user_id.as_str())))
                .collect(),
        }
    }

    /// Identity for a raw token, if one is registered.
    pub fn lookup(&self, token: &str) -> Option<&UserId> {
        self.tokens.get(token)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn resolve_identity(&self, headers: &HeaderMap) -> Result<Option<UserId>, AuthError> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };

        let identity = self.lookup(token).cloned();
        if identity.is_none() {
            tracing::debug!("Bearer token not recognised");
        }
        Ok(identity)
    }
}
