use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware::from_fn, Extension, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use content_search::cache::memory::MemoryCache;
use content_search::cache::ResultCache;
use content_search::config::Config;
use content_search::middleware::rate_limit::{limit_search, IpRateLimiter};
use content_search::middleware::{cors, request_context};
use content_search::provider::adapter::build_adapters;
use content_search::scoring::engine::{ScoringEngine, ScoringWeights};
use content_search::search::engine::SearchEngine;
use content_search::search::handlers::handle_search;
use content_search::store::sqlite::SqliteStore;
use content_search::store::ContentStore;
use content_search::sync::handlers::handle_sync;
use content_search::sync::orchestrator::SyncOrchestrator;
use content_search::sync::scheduler::start_sync_scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (invalid values are fatal):
    let config = Config::from_env()?;
    init_tracing(&config);

    tracing::info!("Starting content search service on port {}", config.port);

    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 2. Storage and result cache:
    let store: Arc<dyn ContentStore> = Arc::new(SqliteStore::new(&config.database_path)?);
    let cache: Arc<dyn ResultCache> = Arc::new(MemoryCache::new());
    tracing::info!("Store ready at {}", config.database_path);

    // 3. Provider adapters from the registry:
    let providers = store.active_providers()?;
    let adapters = build_adapters(&providers);
    tracing::info!(
        "Provider adapters created: {} ({} registered)",
        adapters.len(),
        providers.len()
    );

    // 4. Sync pipeline; the scheduler's first tick fires immediately and
    // doubles as the startup sync:
    let scoring = ScoringEngine::new(ScoringWeights::default());
    let orchestrator =
        SyncOrchestrator::new(adapters, Arc::clone(&store), scoring, Arc::clone(&cache));

    let shutdown = CancellationToken::new();
    start_sync_scheduler(
        Arc::clone(&orchestrator),
        config.sync_interval_seconds,
        shutdown.clone(),
    );

    // 5. Search engine:
    let engine = Arc::new(SearchEngine::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        Duration::from_secs(config.cache_ttl_seconds),
    ));

    // 6. Per-IP rate limiter for the search route:
    let limiter = IpRateLimiter::new(config.rate_limit_per_minute);
    limiter.spawn_cleanup(Duration::from_secs(300), Duration::from_secs(600));

    // 7. HTTP router:
    let search_routes = Router::new()
        .route("/search", get(handle_search))
        .route_layer(from_fn(limit_search));

    let api = Router::new()
        .merge(search_routes)
        .route("/admin/sync", post(handle_sync))
        .route("/health", get(handle_health));

    let app = Router::new()
        .nest("/api/v1", api)
        .layer(from_fn(request_context))
        .layer(from_fn(cors))
        .layer(Extension(engine))
        .layer(Extension(orchestrator))
        .layer(Extension(Arc::clone(&store)))
        .layer(Extension(Arc::clone(&cache)))
        .layer(Extension(limiter));

    // 8. Serve:
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let level = match config.log_level.as_str() {
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    if config.log_encoding == "json" {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_max_level(level).init();
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    services: HashMap<String, String>,
}

/// GET /api/v1/health. Pings the downstream dependencies; 503 when any of
/// them is unhealthy.
async fn handle_health(
    Extension(store): Extension<Arc<dyn ContentStore>>,
    Extension(cache): Extension<Arc<dyn ResultCache>>,
) -> (StatusCode, Json<HealthResponse>) {
    let mut services = HashMap::new();
    let mut healthy = true;

    match store.ping() {
        Ok(()) => {
            services.insert("store".to_string(), "healthy".to_string());
        }
        Err(err) => {
            tracing::warn!("Store health check failed: {}", err);
            services.insert("store".to_string(), "unhealthy".to_string());
            healthy = false;
        }
    }

    match cache.ping().await {
        Ok(()) => {
            services.insert("cache".to_string(), "healthy".to_string());
        }
        Err(err) => {
            tracing::warn!("Cache health check failed: {}", err);
            services.insert("cache".to_string(), "unhealthy".to_string());
            healthy = false;
        }
    }

    let (status_code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            services,
        }),
    )
}
