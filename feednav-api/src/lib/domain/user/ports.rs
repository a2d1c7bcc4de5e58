use async_trait::async_trait;

use crate::domain::user::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::OAuthProfile;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;

/// Persistence operations for the user aggregate.
///
/// Pure data access: no validation, no domain errors.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Retrieve user by identifier, including the password hash.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Retrieve user by email address, including the password hash.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError>;

    /// Retrieve the public projection of a user (no password hash is read).
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_profile_by_id(&self, id: &UserId)
        -> Result<Option<UserProfile>, RepositoryError>;

    /// Persist a password-flow user.
    ///
    /// # Arguments
    /// * `id` - Pre-generated identifier
    /// * `email` - Validated email address
    /// * `password_hash` - bcrypt hash
    ///
    /// # Errors
    /// * `Conflict` - Email already stored
    /// * `Database` - Database operation failed
    async fn create(
        &self,
        id: &UserId,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Persist a user first seen through an OAuth provider.
    ///
    /// Stores an empty password hash and marks the email verified.
    ///
    /// # Errors
    /// * `Conflict` - Email already stored
    /// * `Database` - Database operation failed
    async fn create_from_oauth(
        &self,
        id: &UserId,
        profile: &OAuthProfile,
    ) -> Result<User, RepositoryError>;

    /// Apply a partial update.
    ///
    /// # Returns
    /// `true` when a row was updated, `false` if the user does not exist
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn update(&self, id: &UserId, command: &UpdateUserCommand)
        -> Result<bool, RepositoryError>;

    /// Refresh a user from an OAuth login.
    ///
    /// Fills `name`/`avatar` only where blank and always sets the email verified.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn update_from_oauth(
        &self,
        id: &UserId,
        profile: &OAuthProfile,
    ) -> Result<bool, RepositoryError>;

    /// Whether any user is stored under this email.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn exists(&self, email: &EmailAddress) -> Result<bool, RepositoryError>;
}
