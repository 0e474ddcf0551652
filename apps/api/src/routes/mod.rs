pub mod health;
pub mod prompts;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::images::handlers as images;
use crate::outline::handlers as outline;
use crate::projects::handlers as projects;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Outline ingestion
        .route("/api/v1/outline", post(outline::handle_generate_outline))
        // Projects
        .route("/api/v1/projects", get(projects::handle_list_projects))
        .route(
            "/api/v1/projects/latest",
            get(projects::handle_latest_project),
        )
        .route(
            "/api/v1/projects/:id",
            get(projects::handle_get_project).delete(projects::handle_delete_project),
        )
        .route(
            "/api/v1/projects/:id/outline",
            put(projects::handle_update_outline),
        )
        // Images
        .route(
            "/api/v1/projects/:id/images",
            get(images::handle_list_images).post(images::handle_generate_images),
        )
        // Prompt guides
        .route("/api/v1/prompts", get(prompts::handle_list_prompts))
        .route("/api/v1/prompts/:name", get(prompts::handle_get_prompt))
        .with_state(state)
}
