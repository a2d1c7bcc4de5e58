use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::domain::auth::errors::PasswordPolicyError;
use crate::domain::auth::errors::ProfileError;
use crate::user::models::EmailAddress;
use crate::user::models::OAuthProvider;
use crate::user::models::UserProfile;

const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";
const OAUTH_STATE_PREFIX: &str = "oauth_state:";

/// KV key holding a refresh token record.
pub fn refresh_token_key(token: &str) -> String {
    format!("{}{}", REFRESH_TOKEN_PREFIX, token)
}

/// KV key holding a pending OAuth state.
pub fn oauth_state_key(state: &str) -> String {
    format!("{}{}", OAUTH_STATE_PREFIX, state)
}

/// Plaintext password accepted for registration.
///
/// Bounded by bcrypt's 72-byte input limit so no part of the password is
/// silently ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 8;
    pub const MAX_BYTES: usize = 72;

    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 72 bytes
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let chars = password.chars().count();
        if chars < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: chars,
            });
        }
        if password.len() > Self::MAX_BYTES {
            return Err(PasswordPolicyError::TooLong {
                max: Self::MAX_BYTES,
                actual: password.len(),
            });
        }
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Registration input. The password policy is applied by the service once
/// the email is known to be free.
#[derive(Clone)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Login input. The password is not checked against the registration policy
/// so a policy change never locks out existing accounts.
#[derive(Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Partial profile update requested by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProfileCommand {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

impl UpdateProfileCommand {
    pub const MAX_NAME_LENGTH: usize = 100;
    pub const MAX_AVATAR_LENGTH: usize = 2048;

    /// Trim and validate the provided fields.
    ///
    /// # Errors
    /// * `Empty` - Neither field provided
    /// * `BlankName` / `NameTooLong` - Invalid display name
    /// * `InvalidAvatar` - Avatar is not an http(s) URL or is too long
    pub fn new(name: Option<String>, avatar: Option<String>) -> Result<Self, ProfileError> {
        if name.is_none() && avatar.is_none() {
            return Err(ProfileError::Empty);
        }

        let name = name
            .map(|n| {
                let trimmed = n.trim().to_string();
                if trimmed.is_empty() {
                    Err(ProfileError::BlankName)
                } else if trimmed.chars().count() > Self::MAX_NAME_LENGTH {
                    Err(ProfileError::NameTooLong {
                        max: Self::MAX_NAME_LENGTH,
                    })
                } else {
                    Ok(trimmed)
                }
            })
            .transpose()?;

        let avatar = avatar
            .map(|a| {
                let trimmed = a.trim().to_string();
                let has_scheme = trimmed.starts_with("https://") || trimmed.starts_with("http://");
                if !has_scheme || trimmed.len() > Self::MAX_AVATAR_LENGTH {
                    Err(ProfileError::InvalidAvatar)
                } else {
                    Ok(trimmed)
                }
            })
            .transpose()?;

        Ok(Self { name, avatar })
    }
}

/// Access/refresh token pair handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful register/login/OAuth login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// Value stored under `refresh_token:<token>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    pub user_id: String,
    pub email: String,
}

/// Value stored under `oauth_state:<state>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthStateRecord {
    pub provider: OAuthProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}
