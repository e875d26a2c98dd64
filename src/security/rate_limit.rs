//! Named, keyed rate limiting.
//!
//! Each policy is identified by name (e.g. `createNote`) and tracks one slot
//! per caller key. Slots live in a `DashMap`, so a consume on one key holds
//! that key's shard lock for the whole read-modify-write.

use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::PolicyConfig;
use crate::observability::metrics;

/// Rate limiter failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// The key has no units left under this policy.
    #[error("Rate limit `{policy}` exceeded, retry after {retry_after:?}")]
    Exhausted { policy: String, retry_after: Duration },

    /// No policy with this name is configured.
    #[error("Unknown rate limit policy `{0}`")]
    UnknownPolicy(String),
}

/// Quota tracker shared by every request.
pub trait RateLimiter: Send + Sync {
    /// Consume one unit, or fail if none is available.
    fn limit(&self, policy: &str, key: &str) -> Result<(), RateLimitError>;

    /// Report whether a unit is available without consuming it.
    fn check(&self, policy: &str, key: &str) -> Result<(), RateLimitError>;

    /// Forget all usage for a key.
    fn reset(&self, policy: &str, key: &str);

    /// Give back one unit consumed by `limit` whose guarded write failed.
    fn refund(&self, policy: &str, key: &str);
}

/// Consumes between amortized sweeps of idle slots.
const PRUNE_EVERY: u64 = 1024;

/// Parsed policy with durations resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Policy {
    FixedWindow { rate: u32, period: Duration },
    TokenBucket { rate: u32, period: Duration, capacity: u32 },
}

impl From<&PolicyConfig> for Policy {
    fn from(config: &PolicyConfig) -> Self {
        match *config {
            PolicyConfig::FixedWindow { rate, .. } => Policy::FixedWindow {
                rate,
                period: config.period(),
            },
            PolicyConfig::TokenBucket { rate, capacity, .. } => Policy::TokenBucket {
                rate,
                period: config.period(),
                capacity: capacity.unwrap_or(rate),
            },
        }
    }
}

/// A fixed window that opens on the first consume after the previous one
/// elapsed.
#[derive(Debug)]
struct FixedWindow {
    start: Instant,
    used: u32,
}

impl FixedWindow {
    fn try_acquire(
        &mut self,
        rate: u32,
        period: Duration,
        now: Instant,
        consume: bool,
    ) -> Result<(), Duration> {
        if now.saturating_duration_since(self.start) >= period {
            if consume {
                self.start = now;
                self.used = 1;
            }
            return Ok(());
        }
        if self.used < rate {
            if consume {
                self.used += 1;
            }
            Ok(())
        } else {
            Err((self.start + period).saturating_duration_since(now))
        }
    }

    fn is_idle(&self, period: Duration, now: Instant) -> bool {
        self.used == 0 || now.saturating_duration_since(self.start) >= period
    }
}

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn try_acquire(
        &mut self,
        capacity: f64,
        refill_per_sec: f64,
        now: Instant,
        consume: bool,
    ) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            if consume {
                self.tokens -= 1.0;
            }
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / refill_per_sec))
        }
    }

    fn is_full(&self, capacity: f64, refill_per_sec: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens + elapsed * refill_per_sec >= capacity
    }
}

#[derive(Debug)]
enum Slot {
    Window(FixedWindow),
    Bucket(TokenBucket),
}

impl Slot {
    fn fresh(policy: Policy, now: Instant) -> Self {
        match policy {
            Policy::FixedWindow { .. } => Slot::Window(FixedWindow { start: now, used: 0 }),
            Policy::TokenBucket { capacity, .. } => Slot::Bucket(TokenBucket {
                tokens: capacity as f64,
                last_update: now,
            }),
        }
    }

    fn try_acquire(&mut self, policy: Policy, now: Instant, consume: bool) -> Result<(), Duration> {
        match (self, policy) {
            (Slot::Window(window), Policy::FixedWindow { rate, period }) => {
                window.try_acquire(rate, period, now, consume)
            }
            (Slot::Bucket(bucket), Policy::TokenBucket { rate, period, capacity }) => {
                let refill_per_sec = rate as f64 / period.as_secs_f64();
                bucket.try_acquire(capacity as f64, refill_per_sec, now, consume)
            }
            // Slots are created from the same policy they are checked against.
            (slot, policy) => {
                *slot = Slot::fresh(policy, now);
                slot.try_acquire(policy, now, consume)
            }
        }
    }

    fn refund(&mut self, policy: Policy) {
        match (self, policy) {
            (Slot::Window(window), _) => window.used = window.used.saturating_sub(1),
            (Slot::Bucket(bucket), Policy::TokenBucket { capacity, .. }) => {
                bucket.tokens = (bucket.tokens + 1.0).min(capacity as f64);
            }
            (Slot::Bucket(_), _) => {}
        }
    }

    /// True when dropping the slot would not change any future decision.
    fn is_idle(&self, policy: Policy, now: Instant) -> bool {
        match (self, policy) {
            (Slot::Window(window), Policy::FixedWindow { period, .. }) => window.is_idle(period, now),
            (Slot::Bucket(bucket), Policy::TokenBucket { rate, period, capacity }) => {
                bucket.is_full(capacity as f64, rate as f64 / period.as_secs_f64(), now)
            }
            _ => true,
        }
    }
}

/// In-process limiter for a fixed set of named policies.
#[derive(Debug, Default)]
pub struct PolicyRateLimiter {
    policies: HashMap<String, Policy>,
    slots: DashMap<(String, String), Slot>,
    consumes: AtomicU64,
}

impl PolicyRateLimiter {
    pub fn new(policies: &BTreeMap<String, PolicyConfig>) -> Self {
        Self {
            policies: policies
                .iter()
                .map(|(name, config)| (name.clone(), Policy::from(config)))
                .collect(),
            slots: DashMap::new(),
            consumes: AtomicU64::new(0),
        }
    }

    fn policy(&self, name: &str) -> Result<Policy, RateLimitError> {
        self.policies
            .get(name)
            .copied()
            .ok_or_else(|| RateLimitError::UnknownPolicy(name.to_string()))
    }

    fn exhausted(policy: &str, key: &str, retry_after: Duration) -> RateLimitError {
        tracing::warn!(policy = %policy, key = %key, retry_after = ?retry_after, "Rate limit exceeded");
        metrics::record_rate_limited(policy);
        RateLimitError::Exhausted {
            policy: policy.to_string(),
            retry_after,
        }
    }

    pub(crate) fn limit_at(&self, name: &str, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let policy = self.policy(name)?;
        // Sweep before taking the entry lock; `retain` locks every shard.
        if (self.consumes.fetch_add(1, Ordering::Relaxed) + 1) % PRUNE_EVERY == 0 {
            self.prune_expired_at(now);
        }
        let mut slot = self
            .slots
            .entry((name.to_string(), key.to_string()))
            .or_insert_with(|| Slot::fresh(policy, now));

        slot.try_acquire(policy, now, true)
            .map_err(|retry_after| Self::exhausted(name, key, retry_after))
    }

    pub(crate) fn check_at(&self, name: &str, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let policy = self.policy(name)?;
        match self.slots.get_mut(&(name.to_string(), key.to_string())) {
            Some(mut slot) => slot.try_acquire(policy, now, false).map_err(|retry_after| {
                RateLimitError::Exhausted {
                    policy: name.to_string(),
                    retry_after,
                }
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn prune_expired_at(&self, now: Instant) -> usize {
        let before = self.slots.len();
        self.slots.retain(|(name, _), slot| match self.policies.get(name) {
            Some(policy) => !slot.is_idle(*policy, now),
            None => false,
        });
        let pruned = before.saturating_sub(self.slots.len());
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.slots.len(), "Pruned idle rate limit slots");
        }
        pruned
    }

    /// Drop slots whose window has expired or whose bucket is full.
    /// Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    /// Number of keys currently tracked across all policies.
    pub fn tracked_keys(&self) -> usize {
        self.slots.len()
    }
}

impl RateLimiter for PolicyRateLimiter {
    fn limit(&self, policy: &str, key: &str) -> Result<(), RateLimitError> {
        self.limit_at(policy, key, Instant::now())
    }

    fn check(&self, policy: &str, key: &str) -> Result<(), RateLimitError> {
        self.check_at(policy, key, Instant::now())
    }

    fn reset(&self, policy: &str, key: &str) {
        self.slots.remove(&(policy.to_string(), key.to_string()));
    }

    fn refund(&self, policy: &str, key: &str) {
        let Ok(parsed) = self.policy(policy) else {
            return;
        };
        if let Some(mut slot) = self.slots.get_mut(&(policy.to_string(), key.to_string())) {
            slot.refund(parsed);
        }
    }
}
