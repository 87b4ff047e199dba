use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bookshelf_recs::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, Cache, CacheWriterHandle},
    services::{
        language_model::{GeminiClient, LanguageModel},
        library::{InMemoryLibraryStore, LibraryStore, PostgresLibraryStore},
        providers::{CatalogProvider, GoogleBooksProvider, OpenLibraryProvider},
        RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let library = library_store(&config).await?;
    let (cache, cache_writer) = connect_cache(&config).await;

    let mut google_books = GoogleBooksProvider::new(
        http_client.clone(),
        config.google_books_api_url.clone(),
        config.google_books_api_key.clone(),
    );
    let mut open_library =
        OpenLibraryProvider::new(http_client.clone(), config.open_library_api_url.clone());
    if let Some(cache) = &cache {
        google_books = google_books.with_cache(cache.clone(), config.cache_ttl_secs);
        open_library = open_library.with_cache(cache.clone(), config.cache_ttl_secs);
    }
    let catalog: Arc<dyn CatalogProvider> = Arc::new(google_books);
    let fallback_catalog: Arc<dyn CatalogProvider> = Arc::new(open_library);

    let language_model: Option<Arc<dyn LanguageModel>> = if config.assisted_analysis_enabled() {
        let client = GeminiClient::new(
            http_client,
            config.gemini_api_url.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )?;
        tracing::info!(model = %config.gemini_model, "Assisted taste analysis enabled");
        Some(Arc::new(client))
    } else {
        tracing::info!("GEMINI_API_KEY not set, using heuristic taste analysis only");
        None
    };

    let recommender = RecommendationService::new(library, catalog.clone(), language_model);
    let app = create_router(AppState::new(recommender, catalog, Some(fallback_catalog)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// PostgreSQL when configured, otherwise an in-memory library
async fn library_store(config: &Config) -> anyhow::Result<Arc<dyn LibraryStore>> {
    if let Some(database_url) = &config.database_url {
        let pool = create_pool(database_url).await?;
        tracing::info!("Library backed by PostgreSQL");
        return Ok(Arc::new(PostgresLibraryStore::new(pool)));
    }

    let store = match &config.library_file {
        Some(path) => InMemoryLibraryStore::from_json_file(path)
            .await
            .with_context(|| format!("Failed to load library file {}", path))?,
        None => InMemoryLibraryStore::default(),
    };
    tracing::info!("Library held in memory");
    Ok(Arc::new(store))
}

/// Caching is optional: an unreachable Redis only disables it
async fn connect_cache(config: &Config) -> (Option<Cache>, Option<CacheWriterHandle>) {
    let Some(redis_url) = &config.redis_url else {
        return (None, None);
    };

    match Cache::connect(redis_url).await {
        Ok((cache, writer)) => {
            tracing::info!(ttl_secs = config.cache_ttl_secs, "Catalog cache enabled");
            (Some(cache), Some(writer))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, catalog cache disabled");
            (None, None)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
