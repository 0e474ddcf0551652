//! Image generation — prompt building, the upstream client, response normalization
//! and the per-project batch orchestrator.
//!
//! All outbound image API traffic goes through `client::ImageApiClient`. Everything
//! else talks to it through the `ImageBackend` / `ImageFetcher` traits.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod client;
pub mod handlers;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image API error (status {status}): {message}")]
    UpstreamHttp { status: u16, message: String },

    #[error("Unrecognized image response: {0}")]
    UpstreamFormat(String),

    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to download image from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<ImageError>,
    },
}

/// Decoded image payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBytes {
    pub data: Bytes,
    pub content_type: String,
}

impl ImageBytes {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// File extension matching the content type. Unknown types are stored as png.
    pub fn extension(&self) -> &'static str {
        let media = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match media.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// One page's worth of generation input.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub page_number: u32,
    pub prompt: String,
    /// Path of the already generated cover, for every page after it.
    pub style_reference: Option<PathBuf>,
}

/// Produces an image for a prompt. `ImageApiClient` is the production implementation.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageBytes, ImageError>;
}

/// Dereferences an image URL returned by the upstream.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ImageBytes, ImageError>;
}
