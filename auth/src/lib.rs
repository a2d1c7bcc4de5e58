//! Authentication utilities library
//!
//! Provides the credential primitives used by the FeedNav API:
//! - Password hashing (bcrypt)
//! - Access token (JWT) issuance and verification
//! - Opaque refresh token generation
//! - Authentication coordination
//!
//! Nothing in this crate performs I/O. Persisting refresh tokens and users is
//! the service's concern.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_cost(4);
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{AccessClaims, JwtHandler};
//! use chrono::{Duration, Utc};
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!", "feednav");
//! let claims = AccessClaims::new("user123", "alice@example.com", "feednav", Utc::now(), Duration::hours(1));
//! let token = handler.encode(&claims).unwrap();
//! let decoded: AccessClaims = handler.decode(&token).unwrap();
//! assert_eq!(decoded.sub, "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!", "feednav")
//!     .with_hash_cost(4);
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue tokens
//! assert!(auth.verify_password("password123", &hash).unwrap());
//! let access_token = auth.issue_access_token("user123", "alice@example.com").unwrap();
//! let refresh_token = auth.generate_refresh_token();
//! assert!(refresh_token.len() >= 32);
//!
//! // Validate token
//! let claims = auth.validate_access_token(&access_token).unwrap();
//! assert_eq!(claims.email, "alice@example.com");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod refresh;

// Re-export commonly used items
pub use authenticator::Authenticator;
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use refresh::generate_opaque_token;
