pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::services::booking::{BookingEngine, PgBookingStore};
use crate::services::catalog::{CatalogReader, PgCatalog};
use crate::services::seats::{PgSeatInventory, SeatInventory};
use crate::services::users::{PgUserStore, UserStore};

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogReader>,
    pub seats: Arc<dyn SeatInventory>,
    pub bookings: BookingEngine,
    pub users: Arc<dyn UserStore>,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        info!("Database connected");

        db.run_migrations().await?;

        if config.features.seed_database {
            // A failed seed leaves an empty catalog, not a dead server.
            match services::seed::seed_if_empty(&db).await {
                Ok(true) => info!("Demo catalog seeded"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Could not seed database"),
            }
        }

        let cache = match (&config.redis.url, config.features.enable_catalog_cache) {
            (Some(url), true) => match CacheService::connect(url, config.redis.catalog_ttl_secs).await {
                Ok(cache) => {
                    info!("Redis connected, catalog cache enabled");
                    cache
                }
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, catalog cache disabled");
                    CacheService::disabled()
                }
            },
            _ => CacheService::disabled(),
        };

        Ok(Arc::new(Self {
            catalog: Arc::new(PgCatalog::new(db.clone(), cache)),
            seats: Arc::new(PgSeatInventory::new(db.clone())),
            bookings: BookingEngine::new(Arc::new(PgBookingStore::new(db.clone()))),
            users: Arc::new(PgUserStore::new(db)),
            config,
        }))
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Movie Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
