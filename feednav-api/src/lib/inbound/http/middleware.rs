use auth::AccessClaims;
use auth::Authenticator;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;

use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiErrorBody;
use crate::inbound::http::handlers::InternalErrorDetail;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub claims: AccessClaims,
}

/// Middleware that rejects requests without a valid bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(req.headers()).ok_or(AuthError::Unauthorized)?;

    let user = authenticate(&state.authenticator, token).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        e
    })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Middleware that attaches the caller when a valid token is present and
/// otherwise lets the request through anonymously
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = extract_token_from_header(req.headers())
        .and_then(|token| authenticate(&state.authenticator, token).ok());

    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

/// Put the real message of an internal error back into the body.
///
/// Only layered in development mode.
pub async fn expose_internal_errors(response: Response) -> Response {
    let Some(InternalErrorDetail(detail)) = response.extensions().get::<InternalErrorDetail>().cloned()
    else {
        return response;
    };

    (
        response.status(),
        Json(ApiErrorBody::new("INTERNAL_ERROR", detail)),
    )
        .into_response()
}

fn authenticate(authenticator: &Authenticator, token: &str) -> Result<AuthenticatedUser, AuthError> {
    let claims = authenticator.validate_access_token(token)?;

    let user_id = UserId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Token subject is not a user id");
        AuthError::InvalidToken
    })?;

    Ok(AuthenticatedUser {
        user_id,
        email: claims.email.clone(),
        claims,
    })
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
