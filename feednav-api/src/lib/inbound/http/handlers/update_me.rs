use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserEnvelope;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::UpdateProfileCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// HTTP request body for a profile update (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

impl UpdateMeRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, AuthError> {
        Ok(UpdateProfileCommand::new(self.name, self.avatar)?)
    }
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(req): ApiJson<UpdateMeRequest>,
) -> Result<ApiSuccess<UserEnvelope>, ApiError> {
    let command = req.try_into_command()?;

    state
        .auth_service
        .update_profile(&user.user_id, command)
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
