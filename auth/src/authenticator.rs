use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::AccessClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::refresh;

/// Default access token lifetime.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// Authentication coordinator combining password hashing and token handling.
///
/// Provides high-level credential operations by coordinating the password
/// hasher, the JWT handler and refresh token generation.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    access_token_ttl: Duration,
}

impl Authenticator {
    /// Create a new authenticator with default cost and lifetimes.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `issuer` - Issuer tag for access tokens
    pub fn new(jwt_secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret, issuer),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
        }
    }

    /// Override the bcrypt cost factor.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.password_hasher = PasswordHasher::with_cost(cost);
        self
    }

    /// Override the access token lifetime.
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Hasher used for passwords, cheap to copy into blocking tasks.
    pub fn password_hasher(&self) -> PasswordHasher {
        self.password_hasher
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored hash.
    ///
    /// # Errors
    /// * `PasswordError` - Stored hash is malformed
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Issue an access token for a user, valid from now.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_access_token(&self, subject: &str, email: &str) -> Result<String, JwtError> {
        self.issue_access_token_at(subject, email, Utc::now())
    }

    /// Issue an access token with an explicit issuance instant.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_access_token_at(
        &self,
        subject: &str,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = AccessClaims::new(
            subject,
            email,
            self.jwt_handler.issuer(),
            issued_at,
            self.access_token_ttl,
        );
        self.jwt_handler.encode(&claims)
    }

    /// Validate and decode an access token.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiry
    /// * `InvalidToken` - Any other verification failure
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.jwt_handler.decode(token)
    }

    /// Generate a new opaque refresh token.
    pub fn generate_refresh_token(&self) -> String {
        refresh::generate_opaque_token()
    }
}
