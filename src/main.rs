use mnemo::api::{self, app_state::AppState};
use mnemo::config::loader::ConfigLoader;
use mnemo::models::consolidation_repository::ConsolidationRepositoryImpl;
use mnemo::models::entity_repository::EntityRepositoryImpl;
use mnemo::models::memory_repository::MemoryRepositoryImpl;
use mnemo::models::working_repository::WorkingMemoryRepositoryImpl;
use mnemo::observability::{AppMetrics, ObservabilityState, create_observability_router, init_tracing};
use mnemo::services::{create_cleanup_service, create_consolidation_service};
use mnemo::storage::cache::CacheStore;
use mnemo::storage::surrealdb::SurrealPool;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("mnemo");

    info!("Starting Mnemo...");

    let config = ConfigLoader::load()?;
    ConfigLoader::validate(&config)?;
    info!("Configuration loaded successfully");

    let db_pool = SurrealPool::new(config.database.clone()).await?;
    db_pool.init_schema().await?;
    info!("Database connection initialized, schema ensured");

    let cache = CacheStore::connect(&config.cache).await;
    let cache_enabled = cache.is_enabled();
    if cache_enabled {
        info!("Cache tier connected");
    } else {
        info!("Cache tier disabled, running on the durable tier only");
    }

    let memory_repository = Arc::new(MemoryRepositoryImpl::new(db_pool.clone()));
    let entity_repository = Arc::new(EntityRepositoryImpl::new(db_pool.clone()));
    let working_repository = Arc::new(WorkingMemoryRepositoryImpl::new(db_pool.clone()));
    let consolidation_repository = Arc::new(ConsolidationRepositoryImpl::new(db_pool.clone()));
    info!("Repositories initialized");

    let consolidation_service = create_consolidation_service(
        memory_repository.clone(),
        entity_repository.clone(),
        consolidation_repository,
        config.consolidation.clone(),
    );
    info!("Consolidation engine initialized");

    let cleanup_service =
        create_cleanup_service(working_repository.clone(), memory_repository.clone());
    info!("Cleanup service initialized");

    let metrics = Arc::new(AppMetrics::default());

    let app_state = AppState::new(
        db_pool.clone(),
        cache,
        memory_repository,
        entity_repository,
        working_repository,
        consolidation_service,
        cleanup_service,
        metrics.clone(),
    );
    info!("Application state created");

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics,
        cache_enabled,
    ));
    let api_router = api::create_router(app_state);
    let router = create_observability_router(observability_state).merge(api_router);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
