//! Axum route handlers for outline ingestion.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Page;
use crate::outline::parse_outline;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutlineRequest {
    pub theme: String,
    /// Agent-written outline text in the `<page>` convention.
    pub outline: String,
    pub reference_image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutlineResponse {
    pub project_id: String,
    pub outline: Vec<Page>,
    pub created_at: DateTime<Utc>,
}

/// POST /api/v1/outline
///
/// Parses agent-written outline text and stores it as a new draft project.
pub async fn handle_generate_outline(
    State(state): State<AppState>,
    Json(request): Json<GenerateOutlineRequest>,
) -> Result<Json<GenerateOutlineResponse>, AppError> {
    if request.theme.trim().is_empty() {
        return Err(AppError::Validation(
            "Theme is required and must be a string".to_string(),
        ));
    }
    if request.outline.trim().is_empty() {
        return Err(AppError::Validation(
            "Outline text is required and must be a string".to_string(),
        ));
    }

    let outline = parse_outline(&request.outline);
    if outline.is_empty() {
        return Err(AppError::ParseFailed("Failed to parse outline".to_string()));
    }

    let project_id = Uuid::new_v4().to_string();
    let project = state.store.create(
        &project_id,
        &request.theme,
        outline,
        request.reference_image.filter(|r| !r.trim().is_empty()),
    )?;

    info!(
        "Created project {} for theme '{}' with {} pages",
        project.id,
        project.theme,
        project.outline.len()
    );

    Ok(Json(GenerateOutlineResponse {
        project_id: project.id,
        outline: project.outline,
        created_at: project.created_at,
    }))
}
