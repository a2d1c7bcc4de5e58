use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use feednav_api::config::Config;
use feednav_api::config::KvBackend;
use feednav_api::domain::auth::service::AuthService;
use feednav_api::domain::store::KeyValueStore;
use feednav_api::inbound::http::router::create_router;
use feednav_api::outbound::kv::InMemoryKeyValueStore;
use feednav_api::outbound::kv::RedisKeyValueStore;
use feednav_api::outbound::repositories::SqliteUserRepository;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_DB_CONNECTIONS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feednav_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "feednav-api",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        environment = %config.server.environment,
        kv_backend = ?config.kv.backend,
        "Configuration loaded"
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = MAX_DB_CONNECTIONS,
        database = "sqlite",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(database = "sqlite", "Database migrations completed");

    let store: Arc<dyn KeyValueStore> = match config.kv.backend {
        KvBackend::Memory => {
            tracing::warn!("Using in-memory key-value store; sessions do not survive restarts");
            Arc::new(InMemoryKeyValueStore::new())
        }
        KvBackend::Redis => {
            let url = config
                .kv
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("kv.url is required for the redis backend"))?;
            let store = RedisKeyValueStore::connect(url).await?;
            tracing::info!(kv_backend = "redis", "Key-value store connected");
            Arc::new(store)
        }
    };

    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes(), config.jwt.issuer.clone())
            .with_hash_cost(config.password.hash_cost)
            .with_access_token_ttl(chrono::Duration::seconds(
                config.jwt.access_token_ttl_seconds,
            )),
    );
    let user_repository = Arc::new(SqliteUserRepository::new(pool));

    let auth_service = Arc::new(
        AuthService::new(
            user_repository,
            Arc::clone(&store),
            Arc::clone(&authenticator),
        )
        .with_refresh_token_ttl(Duration::from_secs(config.jwt.refresh_token_ttl_seconds))
        .with_oauth_state_ttl(Duration::from_secs(config.oauth.state_ttl_seconds)),
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, authenticator, store, &config);

    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}
