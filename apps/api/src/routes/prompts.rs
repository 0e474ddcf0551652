//! Read-only prompt guides for the agent that writes outlines and images.

use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::images::prompts::IMAGE_GUIDE;
use crate::outline::prompts::OUTLINE_GUIDE;

#[derive(Debug, Serialize)]
pub struct PromptInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct PromptListResponse {
    pub prompts: Vec<PromptInfo>,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub name: String,
    pub text: &'static str,
}

const PROMPTS: &[(&str, &str, &str)] = &[
    (
        "xiaohongshu-outline",
        "Prompt for generating Xiaohongshu content outlines",
        OUTLINE_GUIDE,
    ),
    (
        "xiaohongshu-image",
        "Prompt for generating Xiaohongshu style images",
        IMAGE_GUIDE,
    ),
];

/// GET /api/v1/prompts
pub async fn handle_list_prompts() -> Json<PromptListResponse> {
    Json(PromptListResponse {
        prompts: PROMPTS
            .iter()
            .map(|&(name, description, _)| PromptInfo {
                name,
                description,
                uri: format!("/api/v1/prompts/{name}"),
            })
            .collect(),
    })
}

/// GET /api/v1/prompts/:name
pub async fn handle_get_prompt(Path(name): Path<String>) -> Result<Json<PromptResponse>, AppError> {
    PROMPTS
        .iter()
        .find(|(candidate, _, _)| *candidate == name)
        .map(|&(_, _, text)| {
            Json(PromptResponse {
                name: name.clone(),
                text,
            })
        })
        .ok_or_else(|| AppError::ResourceNotFound(format!("Unknown prompt: {name}")))
}
