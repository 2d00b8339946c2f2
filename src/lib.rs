//! Appliance Monitor
//!
//! Real-time anomaly detection for the power draw of a single appliance.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLIANCE MONITOR                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST /api/telemetry                        GET /ws          │
//! │        │                                       ▲             │
//! │        ▼                                       │             │
//! │  ┌───────────┐   ┌──────────────────────┐   ┌──────────────┐ │
//! │  │  Payload  │──►│ Monitor (one lock)   │──►│ Broadcaster  │ │
//! │  │  parser   │   │  rules → buffer →    │   │ (tokio       │ │
//! │  └───────────┘   │  scaler → forest     │   │  broadcast)  │ │
//! │                  └──────────────────────┘   └──────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};

use config::{Config, DetectorConfig};
use logic::{Broadcaster, Monitor};
use models::Appliance;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub broadcaster: Arc<Broadcaster>,
    pub config: Config,
}

impl AppState {
    /// Wire a monitor for the configured appliance to a fresh broadcaster
    pub fn new(config: Config) -> Self {
        let broadcaster = Arc::new(Broadcaster::new(config.broadcast_capacity));
        let monitor = Arc::new(Monitor::new(
            Appliance::new(config.appliance_id.clone(), config.appliance_name.clone()),
            DetectorConfig::default(),
            broadcaster.clone(),
        ));

        Self {
            monitor,
            broadcaster,
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        // Telemetry ingestion (second path kept for deployed firmware)
        .route("/api/telemetry", post(handlers::telemetry::ingest))
        .route("/api/esp32/data", post(handlers::telemetry::ingest))
        .route("/api/monitor/status", get(handlers::status::get))
        // Observers
        .route("/ws", get(handlers::stream::subscribe))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
