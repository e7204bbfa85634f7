use playtrack::{app, AppConfig, AppState, InMemoryResultStore, PostgresResultStore, ResultStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playtrack=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting game result server");

    let config = AppConfig::from_env();

    // PostgreSQL when DATABASE_URL is set, in-memory otherwise
    let result_store: Arc<dyn ResultStore> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let store = PostgresResultStore::new(pool);
            store.ensure_schema().await?;
            info!("Using PostgreSQL result store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory result store");
            Arc::new(InMemoryResultStore::new())
        }
    };

    let app = app(AppState::new(result_store));

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
