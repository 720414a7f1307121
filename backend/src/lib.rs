//! # Caregiver Reminders Backend
//!
//! Recurring reminders for caregivers: templates define when something
//! should happen, occurrences are derived from them on demand, and a ledger
//! records which occurrences were completed.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers, DTO mappers)
//!     ↓
//! Domain Layer (generator, ledger, scope resolver, services)
//!     ↓
//! Storage Layer (YAML templates, CSV ledger and suppressions)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ServiceConfig;
use crate::domain::{DueService, ReminderService};
use crate::io::rest::{occurrence_apis, template_apis};
use crate::storage::CsvConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub reminder_service: ReminderService,
    pub due_service: DueService,
}

impl AppState {
    pub fn from_connection(csv_conn: Arc<CsvConnection>, config: &ServiceConfig) -> Self {
        let reminder_service = ReminderService::new(csv_conn, config.max_window_days);
        let due_service = DueService::new(reminder_service.clone(), config.due_horizon_hours);
        Self {
            reminder_service,
            due_service,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &ServiceConfig) -> Result<AppState> {
    let csv_conn = Arc::new(CsvConnection::new(&config.data_directory)?);
    info!("Using data directory {}", csv_conn.base_directory().display());

    info!("Setting up domain services");
    Ok(AppState::from_connection(csv_conn, config))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &ServiceConfig) -> Result<Router> {
    let origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed origin '{}'", config.allowed_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(io::rest::health))
        .nest("/templates", template_apis::router())
        .nest("/occurrences", occurrence_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
