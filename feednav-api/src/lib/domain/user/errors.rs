use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Raw data-layer failure surfaced by user repositories.
///
/// Carries no domain meaning; the auth service decides what each case means
/// for the caller.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Stored row could not be decoded: {0}")]
    CorruptRow(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return RepositoryError::Conflict(db_err.message().to_string());
            }
        }
        RepositoryError::Database(err.to_string())
    }
}
