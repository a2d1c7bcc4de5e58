use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::oauth_state_key;
use crate::domain::auth::models::refresh_token_key;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::OAuthStateRecord;
use crate::domain::auth::models::Password;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::models::UpdateProfileCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::store::KeyValueStore;
use crate::user::errors::RepositoryError;
use crate::user::models::EmailAddress;
use crate::user::models::OAuthProfile;
use crate::user::models::OAuthProvider;
use crate::user::models::UpdateUserCommand;
use crate::user::models::UserId;
use crate::user::models::UserProfile;
use crate::user::ports::UserRepository;

/// Default refresh token lifetime (30 days).
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default lifetime of a pending OAuth state (10 minutes).
pub const DEFAULT_OAUTH_STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Verified against when a login has no stored hash to check.
const DUMMY_PASSWORD: &str = "feednav-dummy-password";

/// Domain service implementation for authentication operations.
///
/// Orchestrates the user repository, the key-value store holding refresh
/// tokens and OAuth state, and the credential primitives from `auth`.
pub struct AuthService<UR, KV>
where
    UR: UserRepository,
    KV: KeyValueStore + ?Sized,
{
    repository: Arc<UR>,
    store: Arc<KV>,
    authenticator: Arc<Authenticator>,
    refresh_token_ttl: Duration,
    oauth_state_ttl: Duration,
    dummy_hash: OnceLock<String>,
}

impl<UR, KV> AuthService<UR, KV>
where
    UR: UserRepository,
    KV: KeyValueStore + ?Sized,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `store` - Key-value store for refresh tokens and OAuth state
    /// * `authenticator` - Password hashing and token primitives
    pub fn new(repository: Arc<UR>, store: Arc<KV>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            store,
            authenticator,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            oauth_state_ttl: DEFAULT_OAUTH_STATE_TTL,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    pub fn with_oauth_state_ttl(mut self, ttl: Duration) -> Self {
        self.oauth_state_ttl = ttl;
        self
    }

    /// bcrypt is CPU bound; keep it off the async workers.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.authenticator.password_hasher();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.authenticator.password_hasher();
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    /// Spend one bcrypt verification so failed logins cost the same with or
    /// without a stored hash.
    async fn verify_dummy_password(&self, password: &str) {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash.clone(),
            None => match self.hash_password(DUMMY_PASSWORD).await {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash).clone(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to prepare dummy password hash");
                    return;
                }
            },
        };

        let _ = self.verify_password(password, &hash).await;
    }

    /// Sign an access token and persist a fresh refresh token for the user.
    async fn issue_tokens(&self, user_id: &str, email: &str) -> Result<TokenPair, AuthError> {
        let access_token = self.authenticator.issue_access_token(user_id, email)?;
        let refresh_token = self.authenticator.generate_refresh_token();

        let record = RefreshTokenRecord {
            user_id: user_id.to_string(),
            email: email.to_string(),
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| AuthError::Internal(format!("Failed to encode refresh token: {}", e)))?;

        self.store
            .put(
                &refresh_token_key(&refresh_token),
                &value,
                self.refresh_token_ttl,
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn profile_or_not_found(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        self.repository
            .find_profile_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Find the account behind an OAuth email, creating it on first sight.
    async fn upsert_oauth_user(&self, profile: &OAuthProfile) -> Result<UserId, AuthError> {
        if let Some(existing) = self.repository.find_by_email(&profile.email).await? {
            self.repository
                .update_from_oauth(&existing.id, profile)
                .await?;
            return Ok(existing.id);
        }

        let id = UserId::new();
        match self.repository.create_from_oauth(&id, profile).await {
            Ok(user) => {
                tracing::info!(
                    user_id = %user.id,
                    provider = %profile.provider,
                    "User created from OAuth login"
                );
                Ok(user.id)
            }
            // Lost a race with a concurrent first login for the same email.
            Err(RepositoryError::Conflict(_)) => {
                let existing = self
                    .repository
                    .find_by_email(&profile.email)
                    .await?
                    .ok_or_else(|| {
                        AuthError::Internal("OAuth user vanished after conflict".to_string())
                    })?;
                self.repository
                    .update_from_oauth(&existing.id, profile)
                    .await?;
                Ok(existing.id)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<UR, KV> AuthServicePort for AuthService<UR, KV>
where
    UR: UserRepository,
    KV: KeyValueStore + ?Sized,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AuthError> {
        let email = command.email;

        if self.repository.exists(&email).await? {
            tracing::info!("Registration rejected: email already registered");
            return Err(AuthError::EmailExists(email.to_string()));
        }

        let password = Password::new(command.password)?;

        let id = UserId::new();
        let password_hash = self.hash_password(password.as_str()).await?;

        let user = self
            .repository
            .create(&id, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailExists(email.to_string()),
                other => AuthError::from(other),
            })?;

        let tokens = self
            .issue_tokens(&user.id.to_string(), user.email.as_str())
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthSession {
            tokens,
            user: user.profile(),
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError> {
        let Ok(email) = EmailAddress::new(command.email) else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some(user) = self.repository.find_by_email(&email).await? else {
            tracing::debug!("Login failed: unknown email");
            self.verify_dummy_password(&command.password).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !user.has_password() {
            tracing::debug!(user_id = %user.id, "Login failed: account has no password");
            self.verify_dummy_password(&command.password).await;
            return Err(AuthError::InvalidCredentials);
        }

        if !self
            .verify_password(&command.password, &user.password_hash)
            .await?
        {
            tracing::debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self
            .issue_tokens(&user.id.to_string(), user.email.as_str())
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            tokens,
            user: user.profile(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidRefreshToken);
        }

        // Taking the entry retires the old token before the new one exists.
        let raw = self
            .store
            .take(&refresh_token_key(refresh_token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let record: RefreshTokenRecord = serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(error = %e, "Discarding undecodable refresh token record");
            AuthError::InvalidRefreshToken
        })?;

        let tokens = self.issue_tokens(&record.user_id, &record.email).await?;

        tracing::debug!(user_id = %record.user_id, "Refresh token rotated");

        Ok(tokens)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        if refresh_token.is_empty() {
            return Ok(());
        }

        self.store.delete(&refresh_token_key(refresh_token)).await?;
        Ok(())
    }

    async fn get_me(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        self.profile_or_not_found(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<UserProfile, AuthError> {
        let update = UpdateUserCommand {
            name: command.name,
            avatar: command.avatar,
            is_email_verified: None,
        };

        if !self.repository.update(user_id, &update).await? {
            return Err(AuthError::UserNotFound);
        }

        self.profile_or_not_found(user_id).await
    }

    async fn login_with_oauth(&self, profile: OAuthProfile) -> Result<AuthSession, AuthError> {
        let user_id = self.upsert_oauth_user(&profile).await?;

        let user = self.profile_or_not_found(&user_id).await?;
        let tokens = self
            .issue_tokens(&user.id.to_string(), user.email.as_str())
            .await?;

        tracing::info!(user_id = %user.id, provider = %profile.provider, "User logged in with OAuth");

        Ok(AuthSession { tokens, user })
    }

    async fn create_oauth_state(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<String>,
    ) -> Result<String, AuthError> {
        let state = auth::generate_opaque_token();
        let record = OAuthStateRecord {
            provider,
            redirect_to,
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| AuthError::Internal(format!("Failed to encode OAuth state: {}", e)))?;

        self.store
            .put(&oauth_state_key(&state), &value, self.oauth_state_ttl)
            .await?;

        Ok(state)
    }

    async fn consume_oauth_state(&self, state: &str) -> Result<OAuthStateRecord, AuthError> {
        if state.is_empty() {
            return Err(AuthError::InvalidOAuthState);
        }

        let raw = self
            .store
            .take(&oauth_state_key(state))
            .await?
            .ok_or(AuthError::InvalidOAuthState)?;

        serde_json::from_str(&raw).map_err(|_| AuthError::InvalidOAuthState)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::outbound::kv::memory::InMemoryKeyValueStore;
    use crate::user::models::User;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError>;
            async fn find_profile_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
            async fn create(&self, id: &UserId, email: &EmailAddress, password_hash: &str) -> Result<User, RepositoryError>;
            async fn create_from_oauth(&self, id: &UserId, profile: &OAuthProfile) -> Result<User, RepositoryError>;
            async fn update(&self, id: &UserId, command: &UpdateUserCommand) -> Result<bool, RepositoryError>;
            async fn update_from_oauth(&self, id: &UserId, profile: &OAuthProfile) -> Result<bool, RepositoryError>;
            async fn exists(&self, email: &EmailAddress) -> Result<bool, RepositoryError>;
        }
    }

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(SECRET, "feednav-test").with_hash_cost(4))
    }

    fn service(
        repository: MockTestUserRepository,
    ) -> (
        AuthService<MockTestUserRepository, InMemoryKeyValueStore>,
        Arc<InMemoryKeyValueStore>,
    ) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let service = AuthService::new(Arc::new(repository), Arc::clone(&store), authenticator());
        (service, store)
    }

    fn email(value: &str) -> EmailAddress {
        EmailAddress::new(value.to_string()).unwrap()
    }

    fn user_with_hash(address: &str, password_hash: String) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: email(address),
            password_hash,
            name: None,
            avatar: None,
            is_email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn oauth_profile(address: &str) -> OAuthProfile {
        OAuthProfile {
            provider: OAuthProvider::Google,
            email: email(address),
            name: Some("Alice".to_string()),
            avatar: Some("https://cdn.example.com/alice.png".to_string()),
        }
    }

    async fn store_refresh_token(
        service: &AuthService<MockTestUserRepository, InMemoryKeyValueStore>,
        user_id: &str,
    ) -> TokenPair {
        service
            .issue_tokens(user_id, "alice@example.com")
            .await
            .expect("Failed to issue tokens")
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_exists().times(1).returning(|_| Ok(false));
        repository
            .expect_create()
            .withf(|_, email, hash| email.as_str() == "alice@example.com" && hash.starts_with("$2b$04$"))
            .times(1)
            .returning(|id, email, hash| {
                let mut user = user_with_hash(email.as_str(), hash.to_string());
                user.id = *id;
                Ok(user)
            });

        let (service, store) = service(repository);

        let command = RegisterCommand::new(
            email("alice@example.com"),
            "password123".to_string(),
        );
        let session = service.register(command).await.expect("Registration failed");

        assert_eq!(session.user.email.as_str(), "alice@example.com");

        let claims = authenticator()
            .validate_access_token(&session.tokens.access_token)
            .unwrap();
        assert_eq!(claims.sub, session.user.id.to_string());

        let stored = store
            .get(&refresh_token_key(&session.tokens.refresh_token))
            .await
            .unwrap()
            .expect("Refresh token not stored");
        let record: RefreshTokenRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(record.user_id, session.user.id.to_string());
    }

    #[tokio::test]
    async fn test_register_existing_email() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_exists().times(1).returning(|_| Ok(true));
        repository.expect_create().times(0);

        let (service, _) = service(repository);

        let command = RegisterCommand::new(
            email("alice@example.com"),
            "password123".to_string(),
        );
        let result = service.register(command).await;

        assert!(matches!(result, Err(AuthError::EmailExists(_))));
    }

    #[tokio::test]
    async fn test_register_existing_email_wins_over_weak_password() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_exists().times(1).returning(|_| Ok(true));
        repository.expect_create().times(0);

        let (service, _) = service(repository);

        let command = RegisterCommand::new(email("alice@example.com"), "pw".to_string());
        let result = service.register(command).await;

        assert!(matches!(result, Err(AuthError::EmailExists(_))));
    }

    #[tokio::test]
    async fn test_register_weak_password_for_free_email() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_exists().times(1).returning(|_| Ok(false));
        repository.expect_create().times(0);

        let (service, _) = service(repository);

        let command = RegisterCommand::new(email("alice@example.com"), "pw".to_string());
        let result = service.register(command).await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_conflict_on_insert_is_email_exists() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_exists().times(1).returning(|_| Ok(false));
        repository
            .expect_create()
            .times(1)
            .returning(|_, _, _| Err(RepositoryError::Conflict("users.email".to_string())));

        let (service, _) = service(repository);

        let command = RegisterCommand::new(
            email("alice@example.com"),
            "password123".to_string(),
        );
        let result = service.register(command).await;

        assert!(matches!(result, Err(AuthError::EmailExists(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let hash = authenticator().hash_password("password123").unwrap();
        let user = user_with_hash("alice@example.com", hash);
        let user_id = user.id;

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let (service, _) = service(repository);

        let session = service
            .login(LoginCommand {
                email: "alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .expect("Login failed");

        assert_eq!(session.user.id, user_id);
        assert!(!session.tokens.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_unknown_email_and_wrong_password_are_indistinguishable() {
        let hash = authenticator().hash_password("password123").unwrap();
        let user = user_with_hash("alice@example.com", hash);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .returning(move |email| {
                if email.as_str() == "alice@example.com" {
                    Ok(Some(user.clone()))
                } else {
                    Ok(None)
                }
            });

        let (service, _) = service(repository);

        let unknown = service
            .login(LoginCommand {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();

        let wrong = service
            .login(LoginCommand {
                email: "alice@example.com".to_string(),
                password: "password124".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert!(service.dummy_hash.get().is_some());
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.status(), wrong.status());
    }

    #[tokio::test]
    async fn test_login_oauth_only_account_rejected() {
        let user = user_with_hash("alice@example.com", String::new());

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let (service, _) = service(repository);

        let result = service
            .login(LoginCommand {
                email: "alice@example.com".to_string(),
                password: "anything-at-all".to_string(),
            })
            .await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
        assert!(service.dummy_hash.get().is_some());
    }

    #[tokio::test]
    async fn test_login_malformed_email_is_invalid_credentials() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().times(0);

        let (service, _) = service(repository);

        let result = service
            .login(LoginCommand {
                email: "not-an-email".to_string(),
                password: "password123".to_string(),
            })
            .await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
        assert!(service.dummy_hash.get().is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotation_is_single_use() {
        let (service, store) = service(MockTestUserRepository::new());
        let original = store_refresh_token(&service, "user-1").await;

        let rotated = service
            .refresh(&original.refresh_token)
            .await
            .expect("First refresh failed");

        assert_ne!(rotated.refresh_token, original.refresh_token);
        assert!(store
            .get(&refresh_token_key(&original.refresh_token))
            .await
            .unwrap()
            .is_none());

        assert_eq!(
            service.refresh(&original.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        );

        let claims = authenticator()
            .validate_access_token(&rotated.access_token)
            .unwrap();
        assert_eq!(claims.sub, "user-1");

        assert!(service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let (service, _) = service(MockTestUserRepository::new());

        assert_eq!(
            service.refresh("fabricated-token-that-was-never-stored").await,
            Err(AuthError::InvalidRefreshToken)
        );
        assert_eq!(service.refresh("").await, Err(AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_corrupt_record() {
        let (service, store) = service(MockTestUserRepository::new());
        store
            .put(&refresh_token_key("abc"), "not json", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(service.refresh("abc").await, Err(AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (service, _) = service(MockTestUserRepository::new());
        let tokens = store_refresh_token(&service, "user-1").await;

        assert!(service.logout(&tokens.refresh_token).await.is_ok());
        assert!(service.logout(&tokens.refresh_token).await.is_ok());
        assert!(service.logout("").await.is_ok());

        assert_eq!(
            service.refresh(&tokens.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        );
    }

    #[tokio::test]
    async fn test_get_me_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_profile_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let (service, _) = service(repository);

        assert_eq!(
            service.get_me(&UserId::new()).await,
            Err(AuthError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn test_get_me_database_failure_is_internal() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_profile_by_id()
            .times(1)
            .returning(|_| Err(RepositoryError::Database("connection reset".to_string())));

        let (service, _) = service(repository);

        assert!(service.get_me(&UserId::new()).await.unwrap_err().is_internal());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let user = user_with_hash("alice@example.com", String::new());
        let user_id = user.id;
        let mut updated = user.profile();
        updated.name = Some("Alice".to_string());

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_update()
            .withf(move |id, command| {
                *id == user_id
                    && command.name.as_deref() == Some("Alice")
                    && command.is_email_verified.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(true));
        repository
            .expect_find_profile_by_id()
            .times(1)
            .returning(move |_| Ok(Some(updated.clone())));

        let (service, _) = service(repository);

        let command = UpdateProfileCommand::new(Some("Alice".to_string()), None).unwrap();
        let profile = service.update_profile(&user_id, command).await.unwrap();

        assert_eq!(profile.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_update_profile_missing_user() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_update().times(1).returning(|_, _| Ok(false));

        let (service, _) = service(repository);

        let command = UpdateProfileCommand::new(Some("Alice".to_string()), None).unwrap();
        assert_eq!(
            service.update_profile(&UserId::new(), command).await,
            Err(AuthError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn test_oauth_login_creates_new_user() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create_from_oauth()
            .times(1)
            .returning(|id, profile| {
                let mut user = user_with_hash(profile.email.as_str(), String::new());
                user.id = *id;
                user.name = profile.name.clone();
                user.is_email_verified = true;
                Ok(user)
            });
        repository
            .expect_find_profile_by_id()
            .times(1)
            .returning(|id| {
                let mut user = user_with_hash("alice@example.com", String::new());
                user.id = *id;
                user.is_email_verified = true;
                Ok(Some(user.profile()))
            });
        repository.expect_update_from_oauth().times(0);

        let (service, _) = service(repository);

        let session = service
            .login_with_oauth(oauth_profile("alice@example.com"))
            .await
            .expect("OAuth login failed");

        assert!(session.user.is_email_verified);
        assert!(service.refresh(&session.tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_oauth_login_existing_user_is_refreshed() {
        let existing = user_with_hash("alice@example.com", "$2b$04$hash".to_string());
        let existing_id = existing.id;
        let profile = existing.profile();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository
            .expect_update_from_oauth()
            .withf(move |id, _| *id == existing_id)
            .times(1)
            .returning(|_, _| Ok(true));
        repository.expect_create_from_oauth().times(0);
        repository
            .expect_find_profile_by_id()
            .times(1)
            .returning(move |_| Ok(Some(profile.clone())));

        let (service, _) = service(repository);

        let session = service
            .login_with_oauth(oauth_profile("alice@example.com"))
            .await
            .unwrap();

        assert_eq!(session.user.id, existing_id);
    }

    #[tokio::test]
    async fn test_oauth_state_is_single_use() {
        let (service, _) = service(MockTestUserRepository::new());

        let state = service
            .create_oauth_state(OAuthProvider::Discord, Some("/favorites".to_string()))
            .await
            .unwrap();

        let record = service.consume_oauth_state(&state).await.unwrap();
        assert_eq!(record.provider, OAuthProvider::Discord);
        assert_eq!(record.redirect_to.as_deref(), Some("/favorites"));

        assert_eq!(
            service.consume_oauth_state(&state).await,
            Err(AuthError::InvalidOAuthState)
        );
        assert_eq!(
            service.consume_oauth_state("").await,
            Err(AuthError::InvalidOAuthState)
        );
    }
}
