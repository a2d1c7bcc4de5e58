use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;
use crate::user::models::EmailAddress;

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, AuthError> {
        let email = EmailAddress::new(self.email)?;

        Ok(RegisterCommand::new(email, self.password))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponseData {
    pub token: String,
    pub refresh_token: String,
    pub user: RegisteredUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    let command = req.try_into_command()?;

    let session = state.auth_service.register(command).await?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        RegisterResponseData {
            token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            user: RegisteredUser {
                id: session.user.id.to_string(),
                email: session.user.email.as_str().to_string(),
            },
        },
    ))
}
