use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::store::KeyValueStore;

/// Sliding-window limit applied to one route family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub scope: String,
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub fn new(scope: impl Into<String>, window: Duration, max_requests: u32) -> Self {
        Self {
            scope: scope.into(),
            window,
            max_requests,
        }
    }

    /// Store key holding the window for one client.
    pub fn key(&self, identifier: &str) -> String {
        format!("ratelimit:{}:{}", self.scope, identifier)
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { limit: u32, remaining: u32 },
    Limited { limit: u32, retry_after_secs: u64 },
}

/// Apply the sliding window to the recorded request instants.
///
/// Drops timestamps older than `now_ms - window_ms` in place. When the
/// request is allowed its timestamp is appended; a rejected request is not
/// recorded.
pub fn evaluate(
    timestamps: &mut Vec<i64>,
    now_ms: i64,
    window_ms: i64,
    max_requests: u32,
) -> RateLimitDecision {
    let window_start = now_ms - window_ms;
    timestamps.retain(|&t| t > window_start);

    let used = timestamps.len() as u64;
    if used >= u64::from(max_requests) {
        let oldest = timestamps.iter().copied().min().unwrap_or(now_ms);
        let wait_ms = (oldest + window_ms - now_ms).max(0);
        // Ceiling to whole seconds, never below one.
        let retry_after_secs = ((wait_ms + 999) / 1000).max(1) as u64;

        return RateLimitDecision::Limited {
            limit: max_requests,
            retry_after_secs,
        };
    }

    timestamps.push(now_ms);

    RateLimitDecision::Allowed {
        limit: max_requests,
        remaining: max_requests - timestamps.len() as u32,
    }
}

/// Sliding-window limiter persisting request instants in the key-value store.
///
/// Read-modify-write without a lock: concurrent requests from one client may
/// briefly exceed the limit. Store failures let the request through.
pub struct RateLimiter<KV: KeyValueStore + ?Sized> {
    store: Arc<KV>,
}

impl<KV: KeyValueStore + ?Sized> Clone for RateLimiter<KV> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<KV: KeyValueStore + ?Sized> RateLimiter<KV> {
    pub fn new(store: Arc<KV>) -> Self {
        Self { store }
    }

    pub async fn check(&self, policy: &RateLimitPolicy, identifier: &str) -> RateLimitDecision {
        self.check_at(policy, identifier, Utc::now().timestamp_millis())
            .await
    }

    /// Check and record a request observed at `now_ms` (Unix milliseconds).
    pub async fn check_at(
        &self,
        policy: &RateLimitPolicy,
        identifier: &str,
        now_ms: i64,
    ) -> RateLimitDecision {
        let key = policy.key(identifier);
        let window_ms = policy.window.as_millis() as i64;

        let mut timestamps: Vec<i64> = match self.store.get(&key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(key = %key, error = %e, "Resetting undecodable rate-limit window");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(scope = %policy.scope, error = %e, "Rate limiter store unavailable, allowing request");
                return RateLimitDecision::Allowed {
                    limit: policy.max_requests,
                    remaining: policy.max_requests,
                };
            }
        };

        let decision = evaluate(&mut timestamps, now_ms, window_ms, policy.max_requests);

        if let RateLimitDecision::Allowed { .. } = decision {
            match serde_json::to_string(&timestamps) {
                Ok(value) => {
                    if let Err(e) = self.store.put(&key, &value, policy.window).await {
                        tracing::warn!(scope = %policy.scope, error = %e, "Failed to record rate-limit window");
                    }
                }
                Err(e) => {
                    tracing::warn!(scope = %policy.scope, error = %e, "Failed to encode rate-limit window");
                }
            }
        } else {
            tracing::info!(scope = %policy.scope, identifier = %identifier, "Rate limit exceeded");
        }

        decision
    }
}
