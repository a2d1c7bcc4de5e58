use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserData>,
}

impl SessionResponseData {
    fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }
}

/// Report who is calling, if anyone. Never rejects a bad or missing token.
pub async fn session(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let Some(Extension(user)) = user else {
        return Ok(ApiSuccess::new(
            StatusCode::OK,
            SessionResponseData::anonymous(),
        ));
    };

    let data = match state.auth_service.get_me(&user.user_id).await {
        Ok(profile) => SessionResponseData {
            authenticated: true,
            user: Some(profile.into()),
        },
        Err(AuthError::UserNotFound) => SessionResponseData::anonymous(),
        Err(e) => return Err(e.into()),
    };

    Ok(ApiSuccess::new(StatusCode::OK, data))
}
