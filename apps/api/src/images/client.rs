//! Image API Client — the single point of entry for upstream image generation calls.
//!
//! Speaks either the images-endpoint or the chat-completion request shape, picked
//! from the configured endpoint path. Bearer-token auth on every generation call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ImageApiConfig;
use crate::images::normalizer;
use crate::images::{GenerationRequest, ImageBackend, ImageBytes, ImageError, ImageFetcher};

/// 3:4 portrait.
const IMAGE_SIZE: &str = "1024x1365";
const CHAT_MAX_TOKENS: u32 = 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_DOWNLOAD_CONTENT_TYPE: &str = "image/jpeg";
/// Upper bound on how much of an error body is echoed into the error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Clone)]
pub struct ImageApiClient {
    client: Client,
    config: ImageApiConfig,
}

impl ImageApiClient {
    pub fn new(config: ImageApiConfig) -> Result<Self, ImageError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body(&self, prompt: &str) -> serde_json::Result<serde_json::Value> {
        if self.config.is_images_endpoint() {
            serde_json::to_value(ImagesRequest {
                model: &self.config.model,
                prompt,
                n: 1,
                size: IMAGE_SIZE,
                response_format: "url",
            })
        } else {
            serde_json::to_value(ChatRequest {
                model: &self.config.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens: CHAT_MAX_TOKENS,
            })
        }
    }
}

#[async_trait]
impl ImageBackend for ImageApiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageBytes, ImageError> {
        let body = self
            .request_body(&request.prompt)
            .map_err(|e| ImageError::UpstreamFormat(format!("failed to encode request: {e}")))?;

        debug!(
            "Requesting image for page {} from {} (style reference: {:?})",
            request.page_number,
            self.config.url(),
            request.style_reference
        );

        let response = self
            .client
            .post(self.config.url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::UpstreamHttp {
                status: status.as_u16(),
                message: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let text = response.text().await?;
        normalizer::extract(&text, self.config.is_images_endpoint(), self).await
    }
}

#[async_trait]
impl ImageFetcher for ImageApiClient {
    async fn fetch(&self, url: &str) -> Result<ImageBytes, ImageError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::UpstreamHttp {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("download failed")
                    .to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_DOWNLOAD_CONTENT_TYPE)
            .to_string();
        let data = response.bytes().await?;

        info!("Downloaded image from {url}, type: {content_type}");
        Ok(ImageBytes::new(data, content_type))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
