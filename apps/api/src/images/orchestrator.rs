//! Batch image generation for a project.
//!
//! Flow: filter pages → cover first → remaining pages in order, each referencing the
//! cover → write each result (or a placeholder) under the project's image directory.
//!
//! Generation is strictly sequential. A failing page never aborts the batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::images::prompts::build_image_prompt;
use crate::images::{GenerationRequest, ImageBackend};
use crate::models::Page;

/// Written in place of an image whose generation failed.
pub const PLACEHOLDER_IMAGE: &[u8] = b"placeholder image data";
const PLACEHOLDER_EXTENSION: &str = "png";

/// Outcome of one batch. `images` has an entry for every requested page, real or
/// placeholder; `failures` names the pages that received a placeholder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub images: BTreeMap<u32, String>,
    pub failures: BTreeMap<u32, String>,
}

/// Generates images for `pages` (or the subset in `only_pages`) into `images_dir`.
///
/// Only failing to create the output directory aborts the batch. A page whose image
/// and placeholder both cannot be written is left out of `images` and listed in
/// `failures`.
pub async fn generate_all(
    backend: &dyn ImageBackend,
    pages: &[Page],
    theme: &str,
    images_dir: &Path,
    only_pages: Option<&[u32]>,
) -> std::io::Result<GenerationReport> {
    tokio::fs::create_dir_all(images_dir).await?;

    let selected: Vec<&Page> = match only_pages {
        Some(numbers) => pages
            .iter()
            .filter(|p| numbers.contains(&p.page_number))
            .collect(),
        None => pages.iter().collect(),
    };

    let mut report = GenerationReport::default();
    let cover = selected.iter().copied().find(|p| p.is_cover());

    let cover_path = match cover {
        Some(cover) => generate_page(backend, cover, theme, images_dir, None, &mut report).await,
        None => None,
    };

    let remaining = selected
        .iter()
        .copied()
        .filter(|p| !cover.is_some_and(|c| std::ptr::eq(c, *p)));

    for page in remaining {
        generate_page(
            backend,
            page,
            theme,
            images_dir,
            cover_path.as_deref(),
            &mut report,
        )
        .await;
    }

    info!(
        "Generated {} images ({} placeholders) in {}",
        report.images.len(),
        report.failures.len(),
        images_dir.display()
    );

    Ok(report)
}

async fn generate_page(
    backend: &dyn ImageBackend,
    page: &Page,
    theme: &str,
    images_dir: &Path,
    style_reference: Option<&Path>,
    report: &mut GenerationReport,
) -> Option<PathBuf> {
    let request = GenerationRequest {
        page_number: page.page_number,
        prompt: build_image_prompt(page, theme, style_reference),
        style_reference: style_reference.map(Path::to_path_buf),
    };

    let failure = match backend.generate(&request).await {
        Ok(image) => {
            let path = image_path(images_dir, page.page_number, image.extension());
            match tokio::fs::write(&path, &image.data).await {
                Ok(()) => {
                    record(report, page.page_number, &path);
                    return Some(path);
                }
                Err(e) => format!("failed to write {}: {e}", path.display()),
            }
        }
        Err(e) => e.to_string(),
    };

    error!(
        "Failed to generate image for page {}: {}",
        page.page_number, failure
    );

    let path = image_path(images_dir, page.page_number, PLACEHOLDER_EXTENSION);
    match tokio::fs::write(&path, PLACEHOLDER_IMAGE).await {
        Ok(()) => {
            record(report, page.page_number, &path);
            report.failures.insert(page.page_number, failure);
            Some(path)
        }
        Err(e) => {
            error!(
                "Failed to write placeholder for page {}: {e}",
                page.page_number
            );
            report.failures.insert(
                page.page_number,
                format!("{failure}; placeholder not written: {e}"),
            );
            None
        }
    }
}

fn record(report: &mut GenerationReport, page_number: u32, path: &Path) {
    report
        .images
        .insert(page_number, path.to_string_lossy().into_owned());
}

fn image_path(images_dir: &Path, page_number: u32, extension: &str) -> PathBuf {
    images_dir.join(format!(
        "page_{}_{}.{}",
        page_number,
        Utc::now().timestamp_millis(),
        extension
    ))
}
