//! Fixed-window, in-memory request rate limiting keyed by client address.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::util::error::{HandlerError, HandlerErrorKind};

#[derive(Debug, Clone)]
struct WindowCounter {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, never below 1
    pub fn reset_after_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.reset_at - now).num_seconds().max(1)
    }
}

/// Longest window the limiter accepts, one day
pub const MAX_WINDOW_SECS: u64 = 24 * 60 * 60;

#[derive(Debug)]
pub struct RateLimiter {
    counters: DashMap<String, WindowCounter>,
    max_requests: u32,
    window: Duration,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    /// Windows above [`MAX_WINDOW_SECS`] are clamped.
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        let window_secs = window_secs.min(MAX_WINDOW_SECS) as i64;
        Self {
            counters: DashMap::new(),
            max_requests,
            window: Duration::seconds(window_secs),
            trust_proxy_headers: false,
        }
    }

    /// Key clients on `x-forwarded-for` / `x-real-ip`. Only safe when a
    /// reverse proxy in front of the server overwrites those headers.
    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Count a request for `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Utc::now())
    }

    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| WindowCounter {
                count: 0,
                window_start: now,
            });
        let counter = entry.value_mut();

        if now >= counter.window_start + self.window {
            counter.count = 0;
            counter.window_start = now;
        }

        let allowed = counter.count < self.max_requests;
        if allowed {
            counter.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(counter.count),
            reset_at: counter.window_start + self.window,
        }
    }

    /// Drop counters whose window has ended
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        let window = self.window;
        self.counters.retain(|_, counter| now < counter.window_start + window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }
}

/// Client key: the peer address when the server was started with connect
/// info. With `trust_proxy_headers` the first `x-forwarded-for` hop, then
/// `x-real-ip`, take precedence.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = proxy_client_ip(headers) {
            return ip;
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn proxy_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer, limiter.trust_proxy_headers);
    let now = Utc::now();
    let decision = limiter.check_at(&key, now);
    let reset_after = decision.reset_after_secs(now);

    let mut response = if decision.allowed {
        debug!(client = %key, remaining = decision.remaining, "Rate limit check passed");
        next.run(req).await
    } else {
        warn!(client = %key, "Rate limit exceeded");
        let mut response = HandlerError::new(
            HandlerErrorKind::TooManyRequests,
            "Too many requests, please try again later",
        )
        .into_response();
        response
            .headers_mut()
            .insert(HeaderName::from_static("retry-after"), HeaderValue::from(reset_after));
        response
    };

    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static("ratelimit-limit"), HeaderValue::from(decision.limit));
    headers.insert(
        HeaderName::from_static("ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(HeaderName::from_static("ratelimit-reset"), HeaderValue::from(reset_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(2, 60);
        let now = Utc::now();
        let first = limiter.check_at("a", now);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert!(limiter.check_at("a", now).allowed);
        let third = limiter.check_at("a", now);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, 60);
        let now = Utc::now();
        assert!(limiter.check_at("a", now).allowed);
        assert!(limiter.check_at("b", now).allowed);
        assert!(!limiter.check_at("a", now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, 60);
        let now = Utc::now();
        assert!(limiter.check_at("a", now).allowed);
        assert!(!limiter.check_at("a", now + Duration::seconds(30)).allowed);
        let later = limiter.check_at("a", now + Duration::seconds(60));
        assert!(later.allowed);
        assert_eq!(later.reset_at, now + Duration::seconds(120));
    }

    #[test]
    fn test_cleanup_expired() {
        let limiter = RateLimiter::new(5, 60);
        limiter.check_at("old", Utc::now() - Duration::seconds(120));
        limiter.check("fresh");
        assert_eq!(limiter.tracked_clients(), 2);
        limiter.cleanup_expired();
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_client_key_uses_peer_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.5"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.7"));
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(client_key(&headers, None, false), "unknown");
    }

    #[test]
    fn test_client_key_trusted_proxy_precedence() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer), true), "10.0.0.9");

        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.7"));
        assert_eq!(client_key(&headers, Some(peer), true), "192.0.2.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.5, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer), true), "203.0.113.5");
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let limiter = RateLimiter::new(1, u64::MAX);
        let now = Utc::now();
        let decision = limiter.check_at("a", now);
        assert_eq!(decision.reset_at, now + Duration::seconds(MAX_WINDOW_SECS as i64));
    }
}
