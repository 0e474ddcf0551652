use std::sync::Arc;

use crate::config::Config;
use crate::images::ImageBackend;
use crate::store::ProjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProjectStore>,
    /// Production: `ImageApiClient`. Tests swap in a fake.
    pub images: Arc<dyn ImageBackend>,
    pub config: Config,
}
