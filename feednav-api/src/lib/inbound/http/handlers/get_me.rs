use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserEnvelope;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserEnvelope>, ApiError> {
    state
        .auth_service
        .get_me(&user.user_id)
        .await
        .map_err(ApiError::from)
        .map(|profile| {
            ApiSuccess::new(
                StatusCode::OK,
                UserEnvelope {
                    user: profile.into(),
                },
            )
        })
}
