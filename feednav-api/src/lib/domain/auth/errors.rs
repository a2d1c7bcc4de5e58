use http::StatusCode;
use thiserror::Error;

use crate::domain::store::KvError;
use crate::user::errors::EmailError;
use crate::user::errors::RepositoryError;

/// Error for registration password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password too long: maximum {max} bytes, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for profile update validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Nothing to update: provide name or avatar")]
    Empty,

    #[error("Name must not be blank")]
    BlankName,

    #[error("Name too long: maximum {max} characters")]
    NameTooLong { max: usize },

    #[error("Avatar must be an http(s) URL")]
    InvalidAvatar,
}

/// Typed failure of every authentication operation.
///
/// Each variant maps to a stable machine-readable code and an HTTP status;
/// handlers translate it without further interpretation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid or expired OAuth state")]
    InvalidOAuthState,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    // Same error for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered: {0}")]
    EmailExists(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Machine-readable code sent in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::InvalidOAuthState => "INVALID_OAUTH_STATE",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::EmailExists(_) => "EMAIL_EXISTS",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::InvalidOAuthState => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailExists(_) => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Internal(_))
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<ProfileError> for AuthError {
    fn from(err: ProfileError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<KvError> for AuthError {
    fn from(err: KvError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Verification failures become client errors; signing failures are internal.
impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::TokenExpired => AuthError::TokenExpired,
            auth::JwtError::InvalidToken(_) => AuthError::InvalidToken,
            auth::JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
        }
    }
}
