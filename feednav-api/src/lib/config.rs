use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Shortest HS256 secret accepted at startup.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub kv: KvConfig,
    pub oauth: OAuthConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub hash_cost: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KvBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KvConfig {
    pub backend: KvBackend,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    pub state_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RateLimitPolicyConfig {
    pub window_seconds: u64,
    pub max_requests: u32,
}

impl RateLimitPolicyConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub client_ip_header: String,
    pub login: RateLimitPolicyConfig,
    pub register: RateLimitPolicyConfig,
    pub api: RateLimitPolicyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_environment() -> String {
    "development".to_string()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, KV__URL, CORS__ALLOWED_ORIGINS, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(
                Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }
        if self.kv.backend == KvBackend::Redis && self.kv.url.is_none() {
            return Err(ConfigError::Message(
                "kv.url is required when kv.backend = \"redis\"".to_string(),
            ));
        }
        for policy in [
            &self.rate_limit.login,
            &self.rate_limit.register,
            &self.rate_limit.api,
        ] {
            if policy.window_seconds == 0 || policy.max_requests == 0 {
                return Err(ConfigError::Message(
                    "rate limit windows and limits must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}
