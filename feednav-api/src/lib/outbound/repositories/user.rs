use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::SqlitePool;

use crate::domain::user::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::OAuthProfile;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::ports::UserRepository;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, avatar, is_email_verified, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    name: Option<String>,
    avatar: Option<String>,
    is_email_verified: bool,
    created_at: String,
    updated_at: String,
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::CorruptRow(format!("{}: {}", column, e)))
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_string(&row.id)
                .map_err(|e| RepositoryError::CorruptRow(format!("id: {}", e)))?,
            email: EmailAddress::new(row.email)
                .map_err(|e| RepositoryError::CorruptRow(format!("email: {}", e)))?,
            password_hash: row.password_hash,
            name: row.name,
            avatar: row.avatar,
            is_email_verified: row.is_email_verified,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
        })
    }
}

/// User repository over SQLite, schema-compatible with Cloudflare D1.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert(&self, user: User) -> Result<User, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, avatar, is_email_verified, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.avatar)
        .bind(user.is_email_verified)
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_profile_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        // The hash column is left blank so it never leaves the database.
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, '' AS password_hash, name, avatar, is_email_verified, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| User::try_from(r).map(|user| user.profile()))
            .transpose()
    }

    async fn create(
        &self,
        id: &UserId,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let now = Utc::now();

        self.insert(User {
            id: *id,
            email: email.clone(),
            password_hash: password_hash.to_string(),
            name: None,
            avatar: None,
            is_email_verified: false,
            created_at: now,
            updated_at: now,
        })
        .await
    }

    async fn create_from_oauth(
        &self,
        id: &UserId,
        profile: &OAuthProfile,
    ) -> Result<User, RepositoryError> {
        let now = Utc::now();

        self.insert(User {
            id: *id,
            email: profile.email.clone(),
            password_hash: String::new(),
            name: profile.name.clone(),
            avatar: profile.avatar.clone(),
            is_email_verified: true,
            created_at: now,
            updated_at: now,
        })
        .await
    }

    async fn update(
        &self,
        id: &UserId,
        command: &UpdateUserCommand,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                avatar = COALESCE(?, avatar),
                is_email_verified = COALESCE(?, is_email_verified),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&command.name)
        .bind(&command.avatar)
        .bind(command.is_email_verified)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_from_oauth(
        &self,
        id: &UserId,
        profile: &OAuthProfile,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = CASE WHEN name IS NULL OR name = '' THEN ? ELSE name END,
                avatar = CASE WHEN avatar IS NULL OR avatar = '' THEN ? ELSE avatar END,
                is_email_verified = TRUE,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.avatar)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, email: &EmailAddress) -> Result<bool, RepositoryError> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = ? LIMIT 1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}
