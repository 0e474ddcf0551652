//! Axum route handlers for image generation.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::images::orchestrator::generate_all;
use crate::models::ProjectStatus;
use crate::projects::handlers::require_project_id;
use crate::state::AppState;
use crate::store::ProjectUpdate;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateImagesRequest {
    /// Page numbers to (re)generate. All pages when absent.
    pub pages: Option<Vec<u32>>,
}

#[derive(Debug, Serialize)]
pub struct GenerateImagesResponse {
    pub status: ProjectStatus,
    pub images: BTreeMap<u32, String>,
    /// Pages whose generation failed, with the reason.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<u32, String>,
}

#[derive(Debug, Serialize)]
pub struct ImageEntry {
    pub page: u32,
    pub path: String,
}

/// POST /api/v1/projects/:id/images
///
/// Generates images for the project's pages (cover first) and records their paths.
/// The body is optional; without one every page is generated.
pub async fn handle_generate_images(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    body: Bytes,
) -> Result<Json<GenerateImagesResponse>, AppError> {
    require_project_id(&project_id)?;
    let request = parse_generate_request(&body)?;

    let project = state
        .store
        .get(&project_id)
        .ok_or_else(|| AppError::NotFound(project_id.clone()))?;
    let previous_status = project.status;

    state.store.update(
        &project_id,
        ProjectUpdate {
            status: Some(ProjectStatus::Generating),
            ..Default::default()
        },
    )?;

    let images_dir = state.config.project_images_dir(&project_id);
    let report = match generate_all(
        state.images.as_ref(),
        &project.outline,
        &project.theme,
        &images_dir,
        request.pages.as_deref(),
    )
    .await
    {
        Ok(report) => report,
        Err(e) => {
            warn!("Image batch for project {project_id} aborted: {e}");
            state.store.update(
                &project_id,
                ProjectUpdate {
                    status: Some(previous_status),
                    ..Default::default()
                },
            )?;
            return Err(AppError::Generation(format!(
                "Could not write images to {}: {e}",
                images_dir.display()
            )));
        }
    };

    // Regenerating a subset keeps the images of the other pages.
    let mut images = project.images;
    images.extend(report.images.clone());

    state.store.update(
        &project_id,
        ProjectUpdate {
            images: Some(images),
            status: Some(ProjectStatus::Completed),
            ..Default::default()
        },
    )?;

    info!(
        "Project {}: {} images generated, {} placeholders",
        project_id,
        report.images.len(),
        report.failures.len()
    );

    Ok(Json(GenerateImagesResponse {
        status: ProjectStatus::Completed,
        images: report.images,
        errors: report.failures,
    }))
}

fn parse_generate_request(body: &[u8]) -> Result<GenerateImagesRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateImagesRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// GET /api/v1/projects/:id/images
pub async fn handle_list_images(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<ImageEntry>>, AppError> {
    let project = state
        .store
        .get(&project_id)
        .ok_or_else(|| AppError::NotFound(project_id.clone()))?;

    Ok(Json(
        project
            .images
            .into_iter()
            .map(|(page, path)| ImageEntry { page, path })
            .collect(),
    ))
}
