use axum::extract::State;
use axum::http::StatusCode;

use super::refresh::RefreshTokenRequest;
use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    body: Option<ApiJson<RefreshTokenRequest>>,
) -> Result<ApiSuccess<()>, ApiError> {
    // No readable body means nothing to revoke.
    let refresh_token = body
        .map(|ApiJson(req)| req.refresh_token)
        .unwrap_or_default();

    state.auth_service.logout(&refresh_token).await?;

    Ok(ApiSuccess::message(
        StatusCode::OK,
        "Logged out successfully",
    ))
}
