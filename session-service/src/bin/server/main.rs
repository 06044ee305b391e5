use std::sync::Arc;
use std::time::Duration as StdDuration;

use session_service::config::Config;
use session_service::config::StorageBackend;
use session_service::domain::session::ports::RefreshTokenRepository;
use session_service::domain::session::ports::UserRepository;
use session_service::inbound::http::create_router;
use session_service::outbound::events::welcome_channel;
use session_service::outbound::repositories::InMemoryRefreshTokenRepository;
use session_service::outbound::repositories::InMemoryUserRepository;
use session_service::outbound::repositories::PostgresRefreshTokenRepository;
use session_service::outbound::repositories::PostgresUserRepository;
use session_service::SessionService;
use session_service::TokenSigner;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "session-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        storage = ?config.storage.backend,
        access_token_ttl_hours = config.jwt.access_token_ttl_hours,
        refresh_token_ttl_days = config.session.refresh_token_ttl_days,
        "Configuration loaded"
    );

    match config.storage.backend {
        StorageBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(StdDuration::from_secs(
                    config.database.acquire_timeout_secs,
                ))
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let users = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
            let refresh_tokens = Arc::new(PostgresRefreshTokenRepository::new(pg_pool));
            serve(&config, users, refresh_tokens).await
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on shutdown");

            let users = Arc::new(InMemoryUserRepository::new());
            let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new(Arc::clone(&users)));
            serve(&config, users, refresh_tokens).await
        }
    }
}

async fn serve<UR, RR>(
    config: &Config,
    users: Arc<UR>,
    refresh_tokens: Arc<RR>,
) -> Result<(), anyhow::Error>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    let signer = Arc::new(TokenSigner::new(
        config.jwt.secret.as_bytes(),
        config.jwt.access_token_ttl(),
    )?);

    let (event_publisher, notifier) = welcome_channel(config.notifier.queue_capacity);
    let notifier_task = tokio::spawn(notifier.start_consuming());

    let session_service = Arc::new(SessionService::new(
        users,
        refresh_tokens,
        Arc::clone(&signer),
        Arc::new(event_publisher),
        config.session.refresh_token_ttl(),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(session_service, signer);

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
    }

    notifier_task.abort();
    tracing::info!("Server exited");

    Ok(())
}
