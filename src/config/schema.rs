//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Name of the policy guarding note creation.
pub const CREATE_NOTE_POLICY: &str = "createNote";

/// Root configuration for the notes service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NotesConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Named rate limit policies.
    pub rate_limit: RateLimitConfig,

    /// Bearer tokens and the user profiles they resolve to.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Policies keyed by name, e.g. `[rate_limit.policies.createNote]`.
    pub policies: BTreeMap<String, PolicyConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut policies = BTreeMap::new();
        policies.insert(
            CREATE_NOTE_POLICY.to_string(),
            PolicyConfig::FixedWindow {
                rate: 1,
                period_secs: 60,
            },
        );
        Self { policies }
    }
}

/// A single rate limit policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// `rate` units per window of `period_secs`.
    FixedWindow { rate: u32, period_secs: u64 },

    /// Refills `rate` units every `period_secs`, holding at most `capacity`
    /// (defaults to `rate`).
    TokenBucket {
        rate: u32,
        period_secs: u64,
        #[serde(default)]
        capacity: Option<u32>,
    },
}

impl PolicyConfig {
    pub fn rate(&self) -> u32 {
        match self {
            PolicyConfig::FixedWindow { rate, .. } | PolicyConfig::TokenBucket { rate, .. } => *rate,
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            PolicyConfig::FixedWindow { period_secs, .. }
            | PolicyConfig::TokenBucket { period_secs, .. } => Duration::from_secs(*period_secs),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted bearer tokens.
    pub users: Vec<UserConfig>,
}

/// A user known to the service, seeded into the `users` collection at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Bearer token that authenticates as this user.
    pub token: String,

    /// Identity stored as the owner of the user's notes.
    pub user_id: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Avatar URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}
