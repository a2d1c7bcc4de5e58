use super::errors::PasswordError;

/// Work factor used when none is configured.
pub const DEFAULT_COST: u32 = 10;

/// Password hashing implementation.
///
/// Provides adaptive password hashing (internally uses bcrypt). The cost
/// factor is configurable so tests can run with the bcrypt minimum.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a new password hasher with the default cost factor.
    pub fn new() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Create a password hasher with an explicit cost factor.
    ///
    /// # Arguments
    /// * `cost` - bcrypt work factor (4..=31)
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Configured cost factor.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses bcrypt with a random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Modular crypt format hash (includes version, cost, salt and digest)
    ///
    /// # Errors
    /// * `HashingFailed` - Cost out of range or hashing failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        ::bcrypt::hash(password, self.cost).map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// A wrong password is `Ok(false)`, never an error.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored bcrypt hash
    ///
    /// # Errors
    /// * `VerificationFailed` - Stored hash is malformed
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        ::bcrypt::verify(password, hash)
            .map_err(|e| PasswordError::VerificationFailed(format!("Invalid password hash: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
