//! Axum route handlers for reading and editing stored projects.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{Page, Project, ProjectSummary};
use crate::state::AppState;
use crate::store::ProjectUpdate;

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectSummary>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOutlineRequest {
    pub outline: Vec<Page>,
}

#[derive(Debug, Serialize)]
pub struct UpdateOutlineResponse {
    pub success: bool,
    pub message: String,
}

pub(crate) fn require_project_id(project_id: &str) -> Result<(), AppError> {
    if project_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Project ID is required and must be a string".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/v1/projects
pub async fn handle_list_projects(State(state): State<AppState>) -> Json<ProjectListResponse> {
    let projects = state.store.list();
    Json(ProjectListResponse {
        total: projects.len(),
        projects,
    })
}

/// GET /api/v1/projects/latest
pub async fn handle_latest_project(
    State(state): State<AppState>,
) -> Result<Json<Project>, AppError> {
    state
        .store
        .latest()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("latest".to_string()))
}

/// GET /api/v1/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, AppError> {
    require_project_id(&project_id)?;
    state
        .store
        .get(&project_id)
        .map(Json)
        .ok_or(AppError::NotFound(project_id))
}

/// PUT /api/v1/projects/:id/outline
///
/// Replaces the outline wholesale. Existing image paths are left as they are.
pub async fn handle_update_outline(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<UpdateOutlineRequest>,
) -> Result<Json<UpdateOutlineResponse>, AppError> {
    require_project_id(&project_id)?;

    let project = state.store.update(
        &project_id,
        ProjectUpdate {
            outline: Some(request.outline),
            ..Default::default()
        },
    )?;
    info!(
        "Outline of project {} replaced ({} pages)",
        project.id,
        project.outline.len()
    );

    Ok(Json(UpdateOutlineResponse {
        success: true,
        message: "Outline updated successfully".to_string(),
    }))
}

/// DELETE /api/v1/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_project_id(&project_id)?;
    if state.store.delete(&project_id)? {
        info!("Deleted project {project_id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(project_id))
    }
}
