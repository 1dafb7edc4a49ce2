// Per-role rate limiting backed by an external budget-tracking service

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::models::Role;
use crate::auth::token::TokenService;
use crate::error::ApiError;
use crate::AppState;

/// Fixed accounting window for all roles
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Documented per-role request budgets (requests per window)
pub fn request_budget(role: Role) -> u32 {
    match role {
        Role::Admin => 20,
        Role::User => 10,
        Role::Guest => 5,
    }
}

/// Outcome of a budget check
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub current: i64,
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limiter backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for RateLimitError {
    fn from(error: redis::RedisError) -> Self {
        RateLimitError::Backend(error.to_string())
    }
}

/// Budget accounting engine. Production uses Redis; tests use the
/// in-memory implementation.
#[async_trait]
pub trait RateLimiterEngine: Send + Sync {
    async fn check(&self, key: &str, limit: u32) -> Result<RateDecision, RateLimitError>;
}

// ---------------- Redis implementation ----------------

/// Fixed-window counter in Redis: INCR the key, set the window expiry on
/// first touch. Counting lives entirely in Redis, so multiple API
/// processes share one budget.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    prefix: String,
}

impl RedisRateLimiter {
    pub async fn new(redis_url: &str, window_secs: u64, prefix: String) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| RateLimitError::Backend(format!("invalid redis url: {}", e)))?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            window_secs,
            prefix,
        })
    }
}

#[async_trait]
impl RateLimiterEngine for RedisRateLimiter {
    async fn check(&self, key: &str, limit: u32) -> Result<RateDecision, RateLimitError> {
        let redis_key = format!("{}:{}", self.prefix, key);
        let mut conn = self.manager.clone();
        let current: i64 = conn.incr(&redis_key, 1).await?;
        if current == 1 {
            let _: () = conn.expire(&redis_key, self.window_secs as i64).await?;
        }
        Ok(RateDecision {
            allowed: current <= limit as i64,
            current,
        })
    }
}

// ---------------- In-memory implementation ----------------

/// Single-process fixed window, used by tests and local development
/// without a Redis instance.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    inner: Arc<Mutex<HashMap<String, (i64, std::time::Instant)>>>,
    window_secs: u64,
}

impl InMemoryRateLimiter {
    pub fn new(window_secs: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            window_secs,
        }
    }
}

#[async_trait]
impl RateLimiterEngine for InMemoryRateLimiter {
    async fn check(&self, key: &str, limit: u32) -> Result<RateDecision, RateLimitError> {
        let mut guard = self.inner.lock().await;
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(self.window_secs);
        let entry = guard.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= window {
            *entry = (0, now);
        }
        entry.0 += 1;
        Ok(RateDecision {
            allowed: entry.0 <= limit as i64,
            current: entry.0,
        })
    }
}

// ---------------- Request classification ----------------

/// Classify the caller before any other processing.
///
/// A verifiable bearer token yields its embedded role keyed by user id;
/// everything else (no token, expired, tampered) counts against the guest
/// budget keyed by client IP. Verification failures here are not rejected;
/// that is the auth middleware's job further down the pipeline.
pub fn classify_caller(headers: &HeaderMap, tokens: &TokenService) -> (Role, String) {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        if let Ok(claims) = tokens.verify_access_token(token) {
            return (claims.role, format!("user:{}", claims.sub));
        }
    }
    (Role::Guest, format!("ip:{}", client_ip(headers)))
}

/// Best-effort client address: first X-Forwarded-For entry, set by the
/// fronting proxy in every deployed environment.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware; short-circuits with 429 before authentication
/// runs.
///
/// Failure policy: fail-open. If the budget backend errors the request is
/// admitted and a warning logged; an unreachable Redis must degrade
/// service limits, not availability. (Startup still refuses to boot
/// without a reachable backend.)
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (role, identity) = classify_caller(request.headers(), &state.tokens);
    let key = format!("{}:{}", role, identity);
    let budget = request_budget(role);

    match state.limiter.check(&key, budget).await {
        Ok(decision) if !decision.allowed => {
            debug!(
                "Rate budget exceeded for {} ({} of {} in window)",
                key, decision.current, budget
            );
            Err(ApiError::TooManyRequests)
        }
        Ok(_) => Ok(next.run(request).await),
        Err(e) => {
            warn!("Rate limiter backend unavailable, admitting request: {}", e);
            Ok(next.run(request).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn budgets_match_documented_policy() {
        assert_eq!(request_budget(Role::Admin), 20);
        assert_eq!(request_budget(Role::User), 10);
        assert_eq!(request_budget(Role::Guest), 5);
    }

    #[tokio::test]
    async fn in_memory_window_admits_until_budget_then_rejects() {
        let limiter = InMemoryRateLimiter::new(60);
        for i in 1..=5 {
            let decision = limiter.check("guest:ip:1.2.3.4", 5).await.unwrap();
            assert!(decision.allowed, "request {} should be admitted", i);
        }
        let decision = limiter.check("guest:ip:1.2.3.4", 5).await.unwrap();
        assert!(!decision.allowed, "sixth request must be rejected");
        assert_eq!(decision.current, 6);
    }

    #[tokio::test]
    async fn budgets_are_tracked_per_key() {
        let limiter = InMemoryRateLimiter::new(60);
        for _ in 0..5 {
            limiter.check("guest:ip:1.2.3.4", 5).await.unwrap();
        }
        // A different caller still has a full budget.
        let decision = limiter.check("guest:ip:5.6.7.8", 5).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.current, 1);
    }

    #[tokio::test]
    async fn window_resets_after_elapsing() {
        let limiter = InMemoryRateLimiter::new(0);
        for _ in 0..6 {
            limiter.check("k", 5).await.unwrap();
        }
        // Zero-length window: the next check starts a fresh window.
        let decision = limiter.check("k", 5).await.unwrap();
        assert!(decision.allowed);
    }

    fn tokens() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    #[test]
    fn authenticated_callers_classify_by_token_role() {
        let tokens = tokens();
        let token = tokens
            .generate_access_token(7, "admin@example.com", Role::Admin)
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let (role, identity) = classify_caller(&headers, &tokens);
        assert_eq!(role, Role::Admin);
        assert_eq!(identity, "user:7");
    }

    #[test]
    fn unauthenticated_callers_default_to_guest_by_ip() {
        let tokens = tokens();

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        let (role, identity) = classify_caller(&headers, &tokens);
        assert_eq!(role, Role::Guest);
        assert_eq!(identity, "ip:1.2.3.4");

        let (role, identity) = classify_caller(&HeaderMap::new(), &tokens);
        assert_eq!(role, Role::Guest);
        assert_eq!(identity, "ip:unknown");
    }

    #[test]
    fn invalid_tokens_classify_as_guest() {
        let tokens = tokens();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not.a.token"),
        );
        let (role, _) = classify_caller(&headers, &tokens);
        assert_eq!(role, Role::Guest);
    }

    struct FailingEngine;

    #[async_trait]
    impl RateLimiterEngine for FailingEngine {
        async fn check(&self, _key: &str, _limit: u32) -> Result<RateDecision, RateLimitError> {
            Err(RateLimitError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn engine_errors_surface_as_backend_failures() {
        // The middleware treats this as fail-open; covered end to end in
        // the crate-level tests.
        let engine = FailingEngine;
        let result = engine.check("any", 5).await;
        assert!(matches!(result, Err(RateLimitError::Backend(_))));
    }
}
