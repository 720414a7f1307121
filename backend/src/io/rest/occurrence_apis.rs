//! # REST API for Occurrences
//!
//! The merged occurrence view, completion toggling and the "what's due"
//! window for external pollers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use shared::{OccurrenceStatusFilter, ReminderType, ToggleCompletionRequest};
use tracing::{error, info, warn};

use crate::domain::commands::occurrences::OccurrenceQuery;
use crate::io::rest::mappers::{OccurrenceMapper, TemplateMapper};
use crate::AppState;

/// Create a router for occurrence related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_occurrences))
        .route("/summary", get(get_summary))
        .route("/toggle", post(toggle_completion))
        .route("/upcoming", get(get_upcoming))
}

/// Query parameters for GET /api/occurrences; both bounds are inclusive
#[derive(Debug, Deserialize)]
pub struct OccurrenceListParams {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(rename = "type")]
    pub reminder_type: Option<ReminderType>,
    #[serde(default)]
    pub status: OccurrenceStatusFilter,
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// List occurrences in a window with their completion state
pub async fn list_occurrences(
    State(state): State<AppState>,
    Query(params): Query<OccurrenceListParams>,
) -> impl IntoResponse {
    info!("GET /api/occurrences - params: {:?}", params);

    let query = OccurrenceQuery {
        window_start: params.start,
        window_end: params.end,
        reminder_type: params.reminder_type.map(TemplateMapper::reminder_type_to_domain),
        status: OccurrenceMapper::status_to_domain(params.status),
    };

    match state.reminder_service.list_visible_occurrences(&query).await {
        Ok(views) => (StatusCode::OK, Json(OccurrenceMapper::to_list_response(views))).into_response(),
        Err(e) => {
            warn!("Failed to list occurrences: {}", e);
            e.into_response()
        }
    }
}

/// Completed and pending counts over a window
pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    info!("GET /api/occurrences/summary - params: {:?}", params);

    match state.reminder_service.occurrence_summary(params.start, params.end).await {
        Ok(summary) => (StatusCode::OK, Json(OccurrenceMapper::summary_to_dto(summary))).into_response(),
        Err(e) => {
            warn!("Failed to summarize occurrences: {}", e);
            e.into_response()
        }
    }
}

/// Flip the completion state of one occurrence
pub async fn toggle_completion(
    State(state): State<AppState>,
    Json(request): Json<ToggleCompletionRequest>,
) -> impl IntoResponse {
    info!("POST /api/occurrences/toggle - request: {:?}", request);

    match state
        .reminder_service
        .toggle_completion(&request.template_id, request.scheduled_at)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(OccurrenceMapper::to_toggle_response(result))).into_response(),
        Err(e) => {
            error!("Failed to toggle completion: {}", e);
            e.into_response()
        }
    }
}

/// Occurrences due within the configured horizon from now
pub async fn get_upcoming(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/occurrences/upcoming");

    let now = Local::now().naive_local();
    match state.due_service.upcoming(now).await {
        Ok(views) => (StatusCode::OK, Json(OccurrenceMapper::to_list_response(views))).into_response(),
        Err(e) => {
            error!("Failed to list upcoming occurrences: {}", e);
            e.into_response()
        }
    }
}
