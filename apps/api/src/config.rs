use std::path::PathBuf;

use anyhow::{Context, Result};

/// Marker that selects the images-endpoint request and response shapes.
const IMAGES_ENDPOINT_MARKER: &str = "/images/generations";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or empty.
#[derive(Debug, Clone)]
pub struct Config {
    pub image_api: ImageApiConfig,
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

/// Upstream image generation settings.
#[derive(Debug, Clone)]
pub struct ImageApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Path appended to `base_url`, e.g. `/v1/images/generations`.
    pub endpoint: String,
}

impl ImageApiConfig {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    pub fn is_images_endpoint(&self) -> bool {
        self.endpoint.contains(IMAGES_ENDPOINT_MARKER)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            image_api: ImageApiConfig {
                base_url: require_env("IMAGE_API_URL")?,
                api_key: require_env("IMAGE_API_KEY")?,
                model: require_env("IMAGE_MODEL")?,
                endpoint: require_env("ENDPOINTS")?,
            },
            data_dir: PathBuf::from(require_env("DATA_DIR")?),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Directory holding generated images for one project.
    pub fn project_images_dir(&self, project_id: &str) -> PathBuf {
        self.data_dir.join("images").join(project_id)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_api(endpoint: &str) -> ImageApiConfig {
        ImageApiConfig {
            base_url: "https://api.example.com".to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn test_url_joins_base_and_endpoint() {
        assert_eq!(
            image_api("/v1/images/generations").url(),
            "https://api.example.com/v1/images/generations"
        );
    }

    #[test]
    fn test_endpoint_shape_detection() {
        assert!(image_api("/v1/images/generations").is_images_endpoint());
        assert!(!image_api("/v1/chat/completions").is_images_endpoint());
    }

    #[test]
    fn test_project_images_dir() {
        let config = Config {
            image_api: image_api("/v1/chat/completions"),
            data_dir: PathBuf::from("/data"),
            port: 8080,
            rust_log: "info".to_string(),
        };
        assert_eq!(
            config.project_images_dir("abc"),
            PathBuf::from("/data/images/abc")
        );
    }
}
