use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::auth::errors::AuthError;
use crate::user::models::UserProfile;

pub mod get_me;
pub mod health;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;
pub mod session;
pub mod update_me;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// JSON body extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(data)))
    }
}

impl ApiSuccess<()> {
    /// Success envelope carrying only a human-readable message.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::message(message)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Auth(AuthError),
    BadRequest(String),
    TooManyRequests { limit: u32, retry_after: u64 },
}

/// Detail of a suppressed internal error, attached to the response so a
/// development-only layer can put it back into the body.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(AuthError::Internal(detail)) => {
                tracing::error!(error = %detail, "Request failed with internal error");

                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorBody::new(
                        "INTERNAL_ERROR",
                        INTERNAL_ERROR_MESSAGE.to_string(),
                    )),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail(detail));
                response
            }
            ApiError::Auth(err) => (
                err.status(),
                Json(ApiErrorBody::new(err.code(), err.to_string())),
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorBody::new("VALIDATION_ERROR", message)),
            )
                .into_response(),
            ApiError::TooManyRequests { limit, retry_after } => {
                let body = ApiErrorBody {
                    retry_after: Some(retry_after),
                    ..ApiErrorBody::new(
                        "TOO_MANY_REQUESTS",
                        "Too many requests, please try again later".to_string(),
                    )
                };

                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
                headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
                response
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ApiErrorBody {
    pub fn new(error: &'static str, message: String) -> Self {
        Self {
            success: false,
            error,
            message,
            retry_after: None,
        }
    }
}

/// Public user representation shared by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserData {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.name,
            avatar: user.avatar,
            is_email_verified: user.is_email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEnvelope {
    pub user: UserData,
}
