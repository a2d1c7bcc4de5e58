use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::header;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::get_me::get_me;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::session::session;
use super::handlers::update_me::update_me;
use super::middleware::expose_internal_errors;
use super::middleware::optional_auth;
use super::middleware::require_auth;
use super::rate_limit::rate_limit;
use super::rate_limit::RateLimitState;
use crate::config::Config;
use crate::config::RateLimitPolicyConfig;
use crate::domain::auth::service::AuthService;
use crate::domain::rate_limit::RateLimitPolicy;
use crate::domain::rate_limit::RateLimiter;
use crate::domain::store::KeyValueStore;
use crate::outbound::repositories::SqliteUserRepository;

pub type AppAuthService = AuthService<SqliteUserRepository, dyn KeyValueStore>;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AppAuthService>,
    pub authenticator: Arc<Authenticator>,
}

fn policy(scope: &str, config: &RateLimitPolicyConfig) -> RateLimitPolicy {
    RateLimitPolicy::new(scope, config.window(), config.max_requests)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([
            header::RETRY_AFTER,
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
        ])
        .allow_credentials(true)
}

pub fn create_router(
    auth_service: Arc<AppAuthService>,
    authenticator: Arc<Authenticator>,
    store: Arc<dyn KeyValueStore>,
    config: &Config,
) -> Router {
    let state = AppState {
        auth_service,
        authenticator,
    };

    let limiter: RateLimiter<dyn KeyValueStore> = RateLimiter::new(store);
    let limits = &config.rate_limit;
    let limited = |scope: &str, policy_config: &RateLimitPolicyConfig| {
        middleware::from_fn_with_state(
            RateLimitState::new(
                limiter.clone(),
                policy(scope, policy_config),
                &limits.client_ip_header,
            ),
            rate_limit,
        )
    };

    let auth_routes = Router::new()
        .route(
            "/register",
            post(register).layer(limited("register", &limits.register)),
        )
        .route("/login", post(login).layer(limited("login", &limits.login)))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route(
            "/me",
            get(get_me)
                .patch(update_me)
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        .route(
            "/session",
            get(session).route_layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth,
            )),
        );

    let api_routes = Router::new()
        .nest("/api/auth", auth_routes)
        .layer(limited("api", &limits.api));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let mut router = Router::new()
        .route("/health", get(health))
        .merge(api_routes);

    if config.server.is_development() {
        router = router.layer(middleware::map_response(expose_internal_errors));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(cors_layer(&config.cors.allowed_origins)),
        )
        .with_state(state)
}
