//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates and periods > 0, addresses parse)
//! - Detect conflicting auth entries
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NotesConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{NotesConfig, PolicyConfig, CREATE_NOTE_POLICY};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("rate_limit.policies.{0} is required")]
    MissingPolicy(&'static str),

    #[error("rate_limit.policies.{0}: rate must be greater than zero")]
    ZeroRate(String),

    #[error("rate_limit.policies.{0}: period_secs must be greater than zero")]
    ZeroPeriod(String),

    #[error("rate_limit.policies.{0}: capacity must be at least 1")]
    ZeroCapacity(String),

    #[error("auth.users[{0}]: token must not be empty")]
    EmptyToken(usize),

    #[error("auth.users[{0}]: user_id must not be empty")]
    EmptyUserId(usize),

    #[error("auth.users[{0}]: token is already assigned to another user")]
    DuplicateToken(usize),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &NotesConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if !config.rate_limit.policies.contains_key(CREATE_NOTE_POLICY) {
        errors.push(ValidationError::MissingPolicy(CREATE_NOTE_POLICY));
    }

    for (name, policy) in &config.rate_limit.policies {
        if policy.rate() == 0 {
            errors.push(ValidationError::ZeroRate(name.clone()));
        }
        if policy.period().is_zero() {
            errors.push(ValidationError::ZeroPeriod(name.clone()));
        }
        if let PolicyConfig::TokenBucket { capacity: Some(0), .. } = policy {
            errors.push(ValidationError::ZeroCapacity(name.clone()));
        }
    }

    let mut tokens = HashSet::new();
    for (i, user) in config.auth.users.iter().enumerate() {
        if user.token.is_empty() {
            errors.push(ValidationError::EmptyToken(i));
        } else if !tokens.insert(user.token.as_str()) {
            errors.push(ValidationError::DuplicateToken(i));
        }
        if user.user_id.is_empty() {
            errors.push(ValidationError::EmptyUserId(i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
