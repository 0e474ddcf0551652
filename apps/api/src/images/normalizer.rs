//! Image Response Normalizer — absorbs the different ways upstream APIs hand back an
//! image and produces one `ImageBytes`.
//!
//! Classification is pure (`classify`); only `Url` sources touch the network
//! (`resolve`). Priority order:
//!
//! images endpoint: `data[0].url` → `data[0].b64_json` → error
//! chat endpoint:   markdown image link → bare URL → `data:image` URI → bare base64 → verbatim text

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::images::{ImageBytes, ImageError, ImageFetcher};

/// Standard alphabet, decoded the forgiving way: padding optional, non-zero trailing
/// bits accepted.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[.*?\]\((https?://[^)]+)\)").expect("Invalid regex pattern")
});
static BASE64_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=]+$").expect("Invalid regex pattern"));

const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Where the image bytes live, as reported by the upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Must be downloaded.
    Url(String),
    /// Standard base64, no prefix.
    Base64(String),
    /// Payload of a `data:image/...;base64,` URI.
    DataUri { media_type: String, payload: String },
    /// Unrecognized chat text, used as the payload as-is.
    Verbatim(String),
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<Value>,
}

/// Extracts image bytes from a successful upstream response body.
pub async fn extract(
    body: &str,
    images_endpoint: bool,
    fetcher: &dyn ImageFetcher,
) -> Result<ImageBytes, ImageError> {
    let source = classify(body, images_endpoint)?;
    resolve(source, fetcher).await
}

/// Decides which shape the upstream used without doing any I/O.
pub fn classify(body: &str, images_endpoint: bool) -> Result<ImageSource, ImageError> {
    if images_endpoint {
        classify_images_response(body)
    } else {
        classify_chat_response(body)
    }
}

fn classify_images_response(body: &str) -> Result<ImageSource, ImageError> {
    let response: ImagesResponse = serde_json::from_str(body)
        .map_err(|e| ImageError::UpstreamFormat(format!("response is not valid JSON: {e}")))?;

    let datum = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ImageError::UpstreamFormat("no image data in response".to_string()))?;

    if let Some(url) = datum.url.filter(|u| !u.is_empty()) {
        info!("Generated image URL: {url}");
        Ok(ImageSource::Url(url))
    } else if let Some(encoded) = datum.b64_json.filter(|b| !b.is_empty()) {
        info!("Generated image in base64 format");
        Ok(ImageSource::Base64(encoded))
    } else {
        Err(ImageError::UpstreamFormat("no url or base64 data".to_string()))
    }
}

fn classify_chat_response(body: &str) -> Result<ImageSource, ImageError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ImageError::UpstreamFormat(format!("response is not valid JSON: {e}")))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .and_then(|content| content.as_str().map(str::to_string))
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ImageError::UpstreamFormat("no image content in response".to_string()))?;

    Ok(classify_chat_content(&content))
}

/// Chat content never fails to classify; unrecognized text is used verbatim.
pub fn classify_chat_content(content: &str) -> ImageSource {
    if let Some(url) = MARKDOWN_IMAGE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
    {
        info!("Extracted image URL from markdown: {url}");
        return ImageSource::Url(url);
    }

    if content.starts_with("http://") || content.starts_with("https://") {
        return ImageSource::Url(content.to_string());
    }

    if let Some(rest) = content
        .strip_prefix("data:")
        .filter(|rest| rest.starts_with("image"))
    {
        let (header, payload) = rest.split_once(',').unwrap_or((rest, ""));
        let media_type = header.split(';').next().unwrap_or(DEFAULT_CONTENT_TYPE);
        return ImageSource::DataUri {
            media_type: media_type.to_string(),
            payload: payload.to_string(),
        };
    }

    if BASE64_ONLY.is_match(content) {
        return ImageSource::Base64(content.to_string());
    }

    warn!(
        "Chat response is not a recognized image encoding; using {} raw bytes",
        content.len()
    );
    ImageSource::Verbatim(content.to_string())
}

/// Turns a classified source into bytes, downloading `Url` sources.
pub async fn resolve(
    source: ImageSource,
    fetcher: &dyn ImageFetcher,
) -> Result<ImageBytes, ImageError> {
    match source {
        ImageSource::Url(url) => match fetcher.fetch(&url).await {
            Ok(image) => Ok(image),
            Err(e) => Err(ImageError::Download {
                url,
                source: Box::new(e),
            }),
        },
        ImageSource::Base64(encoded) => {
            let data = decode_base64(&encoded)?;
            let content_type = sniff_content_type(&data);
            Ok(ImageBytes::new(data, content_type))
        }
        ImageSource::DataUri {
            media_type,
            payload,
        } => {
            if payload.trim().is_empty() {
                return Err(ImageError::UpstreamFormat(
                    "data URI carries no payload".to_string(),
                ));
            }
            let data = decode_base64(&payload)?;
            Ok(ImageBytes::new(data, media_type))
        }
        ImageSource::Verbatim(text) => {
            let data = text.into_bytes();
            let content_type = sniff_content_type(&data);
            Ok(ImageBytes::new(data, content_type))
        }
    }
}

/// Decodes up to the first `=`, skipping characters outside the alphabet. A dangling
/// final symbol (length 4k+1) carries no full byte and is dropped.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, ImageError> {
    let mut symbols: String = encoded
        .chars()
        .take_while(|c| *c != '=')
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '/')
        .collect();
    if symbols.len() % 4 == 1 {
        symbols.pop();
    }
    let data = BASE64.decode(symbols)?;
    debug!("Decoded {} bytes of base64 image data", data.len());
    Ok(data)
}

/// Content type from magic bytes; png when unrecognized.
fn sniff_content_type(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        DEFAULT_CONTENT_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every URL it is asked for and answers with a fixed body.
    #[derive(Default)]
    struct RecordingFetcher {
        urls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingFetcher {
        fn failing() -> Self {
            Self {
                urls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageFetcher for RecordingFetcher {
        async fn fetch(&self, url: &str) -> Result<ImageBytes, ImageError> {
            self.urls.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(ImageError::UpstreamHttp {
                    status: 404,
                    message: "Not Found".to_string(),
                });
            }
            Ok(ImageBytes::new(&b"downloaded"[..], "image/jpeg"))
        }
    }

    fn chat_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_images_url_is_downloaded() {
        let fetcher = RecordingFetcher::default();
        let body = r#"{"data":[{"url":"http://x/y.png"}]}"#;
        let image = extract(body, true, &fetcher).await.unwrap();
        assert_eq!(fetcher.urls(), vec!["http://x/y.png".to_string()]);
        assert_eq!(&image.data[..], b"downloaded");
        assert_eq!(image.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_images_b64_json_is_decoded_without_fetch() {
        let fetcher = RecordingFetcher::default();
        let body = r#"{"data":[{"b64_json":"aGVsbG8="}]}"#;
        let image = extract(body, true, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], b"hello");
        assert!(fetcher.urls().is_empty());
    }

    #[test]
    fn test_images_url_wins_over_b64() {
        let body = r#"{"data":[{"url":"https://cdn/a.png","b64_json":"aGVsbG8="}]}"#;
        assert_eq!(
            classify(body, true).unwrap(),
            ImageSource::Url("https://cdn/a.png".to_string())
        );
    }

    #[test]
    fn test_images_without_url_or_b64_is_format_error() {
        let err = classify(r#"{"data":[{"revised_prompt":"x"}]}"#, true).unwrap_err();
        assert!(matches!(err, ImageError::UpstreamFormat(ref m) if m == "no url or base64 data"));
    }

    #[test]
    fn test_images_empty_data_is_format_error() {
        assert!(matches!(
            classify(r#"{"data":[]}"#, true),
            Err(ImageError::UpstreamFormat(_))
        ));
        assert!(matches!(
            classify(r#"{"created": 1}"#, true),
            Err(ImageError::UpstreamFormat(_))
        ));
    }

    #[test]
    fn test_non_json_body_is_format_error() {
        assert!(matches!(
            classify("<html>bad gateway</html>", true),
            Err(ImageError::UpstreamFormat(_))
        ));
        assert!(matches!(
            classify("<html>bad gateway</html>", false),
            Err(ImageError::UpstreamFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_markdown_link_is_downloaded() {
        let fetcher = RecordingFetcher::default();
        let body = chat_body("![img](http://x/y.png)");
        let image = extract(&body, false, &fetcher).await.unwrap();
        assert_eq!(fetcher.urls(), vec!["http://x/y.png".to_string()]);
        assert_eq!(&image.data[..], b"downloaded");
    }

    #[test]
    fn test_chat_markdown_link_inside_prose() {
        let source = classify_chat_content("好的，这是图片：\n![Generated Image](https://cdn.example.com/a.webp)\n祝你喜欢");
        assert_eq!(
            source,
            ImageSource::Url("https://cdn.example.com/a.webp".to_string())
        );
    }

    #[test]
    fn test_chat_bare_url() {
        assert_eq!(
            classify_chat_content("https://cdn.example.com/b.png"),
            ImageSource::Url("https://cdn.example.com/b.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_chat_data_uri() {
        let fetcher = RecordingFetcher::default();
        let body = chat_body("data:image/jpeg;base64,aGVsbG8=");
        let image = extract(&body, false, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], b"hello");
        assert_eq!(image.content_type, "image/jpeg");
        assert!(fetcher.urls().is_empty());
    }

    #[tokio::test]
    async fn test_data_uri_without_payload_is_format_error() {
        let fetcher = RecordingFetcher::default();
        let err = resolve(classify_chat_content("data:image/png;base64"), &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn test_chat_bare_base64() {
        let fetcher = RecordingFetcher::default();
        let body = chat_body("aGVsbG8=");
        let image = extract(&body, false, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], b"hello");
        assert!(fetcher.urls().is_empty());
    }

    #[test]
    fn test_base64_without_padding_is_accepted() {
        assert_eq!(
            classify_chat_content("aGVsbG8"),
            ImageSource::Base64("aGVsbG8".to_string())
        );
    }

    #[tokio::test]
    async fn test_chat_unrecognized_text_is_used_verbatim() {
        let fetcher = RecordingFetcher::default();
        let body = chat_body("抱歉，我无法生成图片。");
        let image = extract(&body, false, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], "抱歉，我无法生成图片。".as_bytes());
    }

    #[tokio::test]
    async fn test_alphabet_only_text_is_always_decoded() {
        let fetcher = RecordingFetcher::default();

        assert_eq!(
            classify_chat_content("aGVsbG9="),
            ImageSource::Base64("aGVsbG9=".to_string())
        );
        let image = extract(&chat_body("aGVsbG9="), false, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], b"hello");

        // Length 4k+1: the dangling symbol is dropped, "hell" decodes to three bytes.
        assert_eq!(
            classify_chat_content("hello"),
            ImageSource::Base64("hello".to_string())
        );
        let image = extract(&chat_body("hello"), false, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], &[0x85, 0xe9, 0x65]);
    }

    #[tokio::test]
    async fn test_b64_json_with_trailing_bits_and_inner_whitespace() {
        let fetcher = RecordingFetcher::default();
        let body = r#"{"data":[{"b64_json":"aGVs\nbG9="}]}"#;
        let image = extract(body, true, &fetcher).await.unwrap();
        assert_eq!(&image.data[..], b"hello");
    }

    #[test]
    fn test_decoding_stops_at_first_padding() {
        assert_eq!(decode_base64("aGk=aGVsbG8=").unwrap(), b"hi");
    }

    #[test]
    fn test_chat_without_content_is_format_error() {
        assert!(matches!(
            classify(r#"{"choices":[]}"#, false),
            Err(ImageError::UpstreamFormat(_))
        ));
        assert!(matches!(
            classify(r#"{"choices":[{"message":{"content":""}}]}"#, false),
            Err(ImageError::UpstreamFormat(_))
        ));
    }

    #[test]
    fn test_markdown_link_takes_priority_over_bare_url() {
        let content = "https://first.example/a.png ![x](https://second.example/b.png)";
        assert_eq!(
            classify_chat_content(content),
            ImageSource::Url("https://second.example/b.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_download_is_wrapped_with_url() {
        let fetcher = RecordingFetcher::failing();
        let err = extract(r#"{"data":[{"url":"http://x/missing.png"}]}"#, true, &fetcher)
            .await
            .unwrap_err();
        match err {
            ImageError::Download { url, source } => {
                assert_eq!(url, "http://x/missing.png");
                assert!(matches!(*source, ImageError::UpstreamHttp { status: 404, .. }));
            }
            other => panic!("expected Download error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decoded_png_is_sniffed() {
        let fetcher = RecordingFetcher::default();
        let encoded = BASE64.encode(b"\x89PNG\r\n\x1a\nrest");
        let image = resolve(ImageSource::Base64(encoded), &fetcher).await.unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.extension(), "png");
    }
}
