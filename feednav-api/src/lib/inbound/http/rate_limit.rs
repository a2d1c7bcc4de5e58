use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::rate_limit::RateLimitDecision;
use crate::domain::rate_limit::RateLimitPolicy;
use crate::domain::rate_limit::RateLimiter;
use crate::domain::store::KeyValueStore;
use crate::inbound::http::handlers::ApiError;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// State for one rate-limited route family.
#[derive(Clone)]
pub struct RateLimitState {
    limiter: RateLimiter<dyn KeyValueStore>,
    policy: Arc<RateLimitPolicy>,
    client_ip_header: Arc<str>,
}

impl RateLimitState {
    pub fn new(
        limiter: RateLimiter<dyn KeyValueStore>,
        policy: RateLimitPolicy,
        client_ip_header: &str,
    ) -> Self {
        Self {
            limiter,
            policy: Arc::new(policy),
            client_ip_header: Arc::from(client_ip_header),
        }
    }
}

/// Sliding-window rate limit keyed by the trusted client IP header.
pub async fn rate_limit(
    State(state): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let identifier = client_identifier(req.headers(), &state.client_ip_header);

    match state.limiter.check(&state.policy, &identifier).await {
        RateLimitDecision::Limited {
            limit,
            retry_after_secs,
        } => ApiError::TooManyRequests {
            limit,
            retry_after: retry_after_secs,
        }
        .into_response(),
        RateLimitDecision::Allowed { limit, remaining } => {
            let mut response = next.run(req).await;

            // The innermost (most specific) limiter reports its numbers.
            let headers = response.headers_mut();
            headers
                .entry("x-ratelimit-limit")
                .or_insert(HeaderValue::from(limit));
            headers
                .entry("x-ratelimit-remaining")
                .or_insert(HeaderValue::from(remaining));

            response
        }
    }
}

/// First address in the trusted header, or `unknown` when absent.
pub fn client_identifier(headers: &HeaderMap, header_name: &str) -> String {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_identifier() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, "cf-connecting-ip"), "unknown");

        headers.insert("cf-connecting-ip", HeaderValue::from_static(" 203.0.113.7 "));
        assert_eq!(client_identifier(&headers, "cf-connecting-ip"), "203.0.113.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.1, 10.0.0.1"));
        assert_eq!(client_identifier(&headers, "x-forwarded-for"), "198.51.100.1");

        headers.insert("cf-connecting-ip", HeaderValue::from_static(""));
        assert_eq!(client_identifier(&headers, "cf-connecting-ip"), "unknown");
    }
}
