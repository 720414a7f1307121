//! # REST API for Reminder Templates
//!
//! Create, read, edit, delete and enable/disable templates. Edits and
//! deletes carry an explicit scope and the revision the caller last saw.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use shared::{
    CreateTemplateRequest, DeleteTemplateRequest, EditTemplateRequest, ReminderType, SetEnabledRequest,
};
use tracing::{error, info, warn};

use crate::domain::commands::templates::{SetEnabledCommand, TemplateListQuery};
use crate::io::rest::mappers::TemplateMapper;
use crate::AppState;

/// Create a router for template related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route("/:id", get(get_template).put(edit_template).delete(delete_template))
        .route("/:id/enabled", put(set_enabled))
}

/// Query parameters for GET /api/templates
#[derive(Debug, Default, Deserialize)]
pub struct TemplateListParams {
    #[serde(rename = "type")]
    pub reminder_type: Option<ReminderType>,
    #[serde(default)]
    pub include_retired: bool,
}

/// List templates
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<TemplateListParams>,
) -> impl IntoResponse {
    info!("GET /api/templates - params: {:?}", params);

    let query = TemplateListQuery {
        reminder_type: params.reminder_type.map(TemplateMapper::reminder_type_to_domain),
        include_retired: params.include_retired,
    };

    match state.reminder_service.list_templates(query).await {
        Ok(templates) => (StatusCode::OK, Json(TemplateMapper::to_list_response(templates))).into_response(),
        Err(e) => {
            error!("Failed to list templates: {}", e);
            e.into_response()
        }
    }
}

/// Create a new template
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> impl IntoResponse {
    info!("POST /api/templates - request: {:?}", request);

    let command = match TemplateMapper::to_create_command(request) {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected template: {}", e);
            return e.into_response();
        }
    };

    match state.reminder_service.create_template(command).await {
        Ok(template) => {
            let response = TemplateMapper::to_create_response(template);
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create template: {}", e);
            e.into_response()
        }
    }
}

/// Get one template
pub async fn get_template(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/templates/{}", id);

    match state.reminder_service.get_template(&id).await {
        Ok(template) => (StatusCode::OK, Json(TemplateMapper::to_template_response(template))).into_response(),
        Err(e) => {
            warn!("Failed to get template '{}': {}", id, e);
            e.into_response()
        }
    }
}

/// Edit a template within a scope
pub async fn edit_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EditTemplateRequest>,
) -> impl IntoResponse {
    info!("PUT /api/templates/{} - request: {:?}", id, request);

    let command = match TemplateMapper::to_edit_command(id, request) {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected edit: {}", e);
            return e.into_response();
        }
    };

    match state.reminder_service.edit_template(command).await {
        Ok(result) => (StatusCode::OK, Json(TemplateMapper::to_edit_response(result))).into_response(),
        Err(e) => {
            error!("Failed to edit template: {}", e);
            e.into_response()
        }
    }
}

/// Delete a template or some of its occurrences
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DeleteTemplateRequest>,
) -> impl IntoResponse {
    info!("DELETE /api/templates/{} - request: {:?}", id, request);

    let command = TemplateMapper::to_delete_command(id, request);
    match state.reminder_service.delete_template(command).await {
        Ok(result) => (StatusCode::OK, Json(TemplateMapper::to_delete_response(result))).into_response(),
        Err(e) => {
            error!("Failed to delete template: {}", e);
            e.into_response()
        }
    }
}

/// Pause or resume a template's due notifications
pub async fn set_enabled(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetEnabledRequest>,
) -> impl IntoResponse {
    info!("PUT /api/templates/{}/enabled - request: {:?}", id, request);

    let command = SetEnabledCommand {
        template_id: id,
        expected_revision: request.expected_revision,
        enabled: request.enabled,
    };

    match state.reminder_service.set_enabled(command).await {
        Ok(template) => (StatusCode::OK, Json(TemplateMapper::to_template_response(template))).into_response(),
        Err(e) => {
            error!("Failed to set enabled: {}", e);
            e.into_response()
        }
    }
}
