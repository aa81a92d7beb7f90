use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinefetch::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, run_migrations, PgContentStore},
    services::{ContentService, Converter, Dispatcher, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinefetch=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let provider = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.language.clone(),
        config.request_timeout(),
    )?;
    let converter = Converter::new(config.image_base_url.clone(), &config.language);

    // Genre tables are loaded here; a failure aborts startup
    let mut content = ContentService::new(
        Arc::new(provider),
        converter,
        Dispatcher::new(config.worker_count),
    )
    .await
    .context("Failed to load genre tables")?;

    if let Some(database_url) = config.database_url.as_deref() {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        content = content.with_store(Arc::new(PgContentStore::new(pool)));
        content.persist_genres().await?;
        tracing::info!("Postgres storage enabled");
    } else {
        tracing::warn!("DATABASE_URL not set, user storage routes are disabled");
    }

    let app = create_router(AppState::new(content));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, workers = config.worker_count, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
