//! # REST API Interface Layer
//!
//! HTTP endpoints for templates and occurrences. Handlers only translate:
//! DTO in, domain command through the service, DTO out. Domain errors map
//! to status codes here and nowhere else.
//!
//! | Error        | Status |
//! |--------------|--------|
//! | `Validation` | 400    |
//! | `NotFound`   | 404    |
//! | `Conflict`   | 409    |
//! | `Storage`    | 500    |

pub mod mappers;
pub mod occurrence_apis;
pub mod template_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ErrorResponse;
use tracing::info;

use crate::domain::errors::ReminderError;

impl ReminderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReminderError::Validation(_) => StatusCode::BAD_REQUEST,
            ReminderError::NotFound(_) => StatusCode::NOT_FOUND,
            ReminderError::Conflict { .. } => StatusCode::CONFLICT,
            ReminderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReminderError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    info!("GET /api/health");
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
