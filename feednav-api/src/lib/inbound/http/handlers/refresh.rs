use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Body shared by refresh and logout. A missing token is treated as empty.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponseData {
    pub token: String,
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshTokenRequest>,
) -> Result<ApiSuccess<RefreshResponseData>, ApiError> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        RefreshResponseData {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
    ))
}
