//! Startup orchestration.
//!
//! Builds the process-wide collaborators from a validated config, in
//! dependency order: store, seeded users, rate limiter, identity provider.

use std::sync::Arc;

use crate::auth::{AuthProvider, TokenAuthProvider};
use crate::config::NotesConfig;
use crate::notes::{NotesService, User, UserId};
use crate::security::{PolicyRateLimiter, RateLimiter};
use crate::store::{DocumentStore, MemoryStore, StoreResult};

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub limiter: Arc<dyn RateLimiter>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Services {
    /// The notes module wired to these collaborators.
    pub fn notes(&self) -> NotesService {
        NotesService::new(self.store.clone(), self.limiter.clone())
    }
}

/// Build the default in-process collaborators and seed configured users.
pub async fn init_services(config: &NotesConfig) -> StoreResult<Services> {
    let store = MemoryStore::new();
    for user in &config.auth.users {
        store
            .put_user(User {
                id: UserId::from(user.user_id.as_str()),
                name: user.name.clone(),
                image: user.image.clone(),
            })
            .await?;
    }
    tracing::info!(users = config.auth.users.len(), "User profiles seeded");

    let limiter = PolicyRateLimiter::new(&config.rate_limit.policies);
    tracing::info!(
        policies = ?config.rate_limit.policies.keys().collect::<Vec<_>>(),
        "Rate limiter configured"
    );

    Ok(Services {
        store: Arc::new(store),
        limiter: Arc::new(limiter),
        auth: Arc::new(TokenAuthProvider::new(&config.auth.users)),
    })
}
