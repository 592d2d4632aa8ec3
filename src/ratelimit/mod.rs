//! Fixed-window rate limiting for sensitive operations (signup, login,
//! password reset). Denial is an ordinary outcome carrying a retry-after
//! hint for the uniform 429 envelope.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny { retry_after_secs: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u32,
}

pub struct RateLimiter {
    max_requests: u32,
    window_secs: u64,
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, chrono::Utc::now().timestamp()).await
    }

    /// Clock-injected variant; `check` supplies the current time
    async fn check_at(&self, key: &str, now: i64) -> RateDecision {
        let mut windows = self.windows.write().await;

        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.saturating_sub(window.started_at);
        if elapsed >= self.window_secs as i64 {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let retry_after = self.window_secs.saturating_sub(elapsed.max(0) as u64);
            return RateDecision::Deny {
                retry_after_secs: retry_after.max(1),
            };
        }

        window.count += 1;
        RateDecision::Allow
    }
}

static LIMITER: OnceLock<RateLimiter> = OnceLock::new();

fn limiter() -> &'static RateLimiter {
    LIMITER.get_or_init(|| {
        let api = &config::config().api;
        RateLimiter::new(api.rate_limit_requests, api.rate_limit_window_secs)
    })
}

/// Consult the shared limiter for a sensitive operation. Disabled
/// environments always allow.
pub async fn check(scope: &str, client_key: &str) -> RateDecision {
    if !config::config().api.enable_rate_limiting {
        return RateDecision::Allow;
    }
    limiter().check(&format!("{}:{}", scope, client_key)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_allows_up_to_quota_then_denies() {
        let limiter = RateLimiter::new(2, 60);
        assert_eq!(limiter.check_at("login:1.2.3.4", 1000).await, RateDecision::Allow);
        assert_eq!(limiter.check_at("login:1.2.3.4", 1001).await, RateDecision::Allow);

        match limiter.check_at("login:1.2.3.4", 1002).await {
            RateDecision::Deny { retry_after_secs } => {
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
            RateDecision::Allow => panic!("expected deny after quota"),
        }
    }

    #[tokio::test]
    async fn window_resets_after_elapsing() {
        let limiter = RateLimiter::new(1, 60);
        assert_eq!(limiter.check_at("signup:k", 0).await, RateDecision::Allow);
        assert!(matches!(
            limiter.check_at("signup:k", 30).await,
            RateDecision::Deny { .. }
        ));
        assert_eq!(limiter.check_at("signup:k", 61).await, RateDecision::Allow);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(1, 60);
        assert_eq!(limiter.check_at("login:a", 0).await, RateDecision::Allow);
        assert_eq!(limiter.check_at("login:b", 0).await, RateDecision::Allow);
    }
}
