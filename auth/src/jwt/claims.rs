use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an access token.
///
/// All fields are required: tokens missing any of them fail verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Email of the subject at issuance time
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    /// Create claims for a user, expiring `ttl` after `issued_at`.
    ///
    /// # Arguments
    /// * `subject` - Unique user identifier
    /// * `email` - User email
    /// * `issuer` - Issuer tag checked on verification
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Lifetime of the token
    pub fn new(
        subject: impl ToString,
        email: impl ToString,
        issuer: impl ToString,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expiration = issued_at + ttl;

        Self {
            sub: subject.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            iss: issuer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_claims() {
        let issued_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let claims = AccessClaims::new(
            "user123",
            "alice@example.com",
            "feednav",
            issued_at,
            Duration::hours(1),
        );

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, "feednav");
        assert_eq!(claims.iat, issued_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }
}
