use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::OAuthStateRecord;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::models::UpdateProfileCommand;
use crate::user::models::OAuthProfile;
use crate::user::models::OAuthProvider;
use crate::user::models::UserId;
use crate::user::models::UserProfile;

/// Port for authentication and session operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Create a password account and open a session.
    ///
    /// # Errors
    /// * `EmailExists` - Email is already registered
    /// * `Internal` - Store or hashing failure
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AuthError>;

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, password-less account or wrong password
    /// * `Internal` - Store or hashing failure
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a new pair, invalidating the old token.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Token unknown, expired, already rotated or logged out
    /// * `Internal` - Store failure
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke a refresh token. Unknown or empty tokens are accepted.
    ///
    /// # Errors
    /// * `Internal` - Store failure
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Public profile of the authenticated user.
    ///
    /// # Errors
    /// * `UserNotFound` - Token outlived its user
    async fn get_me(&self, user_id: &UserId) -> Result<UserProfile, AuthError>;

    /// Update display name and/or avatar.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn update_profile(
        &self,
        user_id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<UserProfile, AuthError>;

    /// Sign in (or sign up) with a profile already verified by an OAuth provider.
    ///
    /// # Errors
    /// * `Internal` - Store failure
    async fn login_with_oauth(&self, profile: OAuthProfile) -> Result<AuthSession, AuthError>;

    /// Record a fresh OAuth `state` value for the authorization redirect.
    ///
    /// # Returns
    /// The opaque state string to send to the provider
    async fn create_oauth_state(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<String>,
    ) -> Result<String, AuthError>;

    /// Consume a `state` value returned by the provider callback.
    ///
    /// # Errors
    /// * `InvalidOAuthState` - Unknown, expired or already consumed
    async fn consume_oauth_state(&self, state: &str) -> Result<OAuthStateRecord, AuthError>;
}
