use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use feednav_api::config::Config;
use feednav_api::config::CorsConfig;
use feednav_api::config::DatabaseConfig;
use feednav_api::config::JwtConfig;
use feednav_api::config::KvBackend;
use feednav_api::config::KvConfig;
use feednav_api::config::OAuthConfig;
use feednav_api::config::PasswordConfig;
use feednav_api::config::RateLimitConfig;
use feednav_api::config::RateLimitPolicyConfig;
use feednav_api::config::ServerConfig;
use feednav_api::domain::auth::service::AuthService;
use feednav_api::domain::store::KeyValueStore;
use feednav_api::inbound::http::router::create_router;
use feednav_api::outbound::kv::InMemoryKeyValueStore;
use feednav_api::outbound::repositories::SqliteUserRepository;
use serde_json::json;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const JWT_ISSUER: &str = "feednav-test";
pub const CLIENT_IP_HEADER: &str = "cf-connecting-ip";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub pool: SqlitePool,
    pub store: Arc<InMemoryKeyValueStore>,
    pub authenticator: Arc<Authenticator>,
    pub api_client: reqwest::Client,
    pub client_ip: String,
}

/// Configuration used by the spawned server; every request goes through
/// the real rate limits.
pub fn test_config(port: u16, environment: &str) -> Config {
    Config {
        server: ServerConfig {
            http_port: port,
            environment: environment.to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        jwt: JwtConfig {
            secret: String::from_utf8_lossy(JWT_SECRET).to_string(),
            issuer: JWT_ISSUER.to_string(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 2_592_000,
        },
        password: PasswordConfig { hash_cost: 4 },
        kv: KvConfig {
            backend: KvBackend::Memory,
            url: None,
        },
        oauth: OAuthConfig {
            state_ttl_seconds: 600,
        },
        rate_limit: RateLimitConfig {
            client_ip_header: CLIENT_IP_HEADER.to_string(),
            login: RateLimitPolicyConfig {
                window_seconds: 900,
                max_requests: 5,
            },
            register: RateLimitPolicyConfig {
                window_seconds: 900,
                max_requests: 5,
            },
            api: RateLimitPolicyConfig {
                window_seconds: 60,
                max_requests: 100,
            },
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    }
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_environment("test").await
    }

    /// Spawn the application with `server.environment` set to `environment`
    pub async fn spawn_with_environment(environment: &str) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let config = test_config(port, environment);

        // A single connection keeps the in-memory database alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&config.database.url)
            .await
            .expect("Failed to open in-memory database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let store = Arc::new(InMemoryKeyValueStore::new());
        let dyn_store: Arc<dyn KeyValueStore> = store.clone();

        let authenticator = Arc::new(
            Authenticator::new(JWT_SECRET, JWT_ISSUER).with_hash_cost(config.password.hash_cost),
        );

        let auth_service = Arc::new(
            AuthService::new(
                Arc::new(SqliteUserRepository::new(pool.clone())),
                Arc::clone(&dyn_store),
                Arc::clone(&authenticator),
            )
            .with_refresh_token_ttl(Duration::from_secs(config.jwt.refresh_token_ttl_seconds)),
        );

        let router = create_router(auth_service, Arc::clone(&authenticator), dyn_store, &config);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            pool,
            store,
            authenticator,
            api_client: reqwest::Client::new(),
            client_ip: format!("198.51.100.{}", port % 250),
        }
    }

    /// Helper to make GET request from the test client address
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .header(CLIENT_IP_HEADER, &self.client_ip)
    }

    /// Helper to make POST request from the test client address
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client
            .post(&format!("{}{}", self.address, path))
            .header(CLIENT_IP_HEADER, &self.client_ip)
    }

    /// Helper to make PATCH request from the test client address
    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(&format!("{}{}", self.address, path))
            .header(CLIENT_IP_HEADER, &self.client_ip)
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register a user and return the parsed response body
    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/register")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log a user in and return the raw response
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register a user and return `(token, refreshToken)`
    pub async fn register_tokens(&self, email: &str, password: &str) -> (String, String) {
        let body: Value = self
            .register(email, password)
            .await
            .json()
            .await
            .expect("Failed to parse response");

        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }
}
