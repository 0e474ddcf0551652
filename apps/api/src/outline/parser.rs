//! Outline Parser — turns tag-delimited outline text into typed `Page` records.
//!
//! Only text inside `<page>...</page>` pairs is ever read. When the generator opened
//! tags but never closed them, the text is split on the open tags instead.
//! Malformed input yields fewer (or zero) pages, never an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Page, PageType};

static PAGE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<page[^>]*>.*?</page>").expect("Invalid regex pattern"));
static PAGE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<page[^>]*>").expect("Invalid regex pattern"));
static PAGE_CLOSE_AND_REST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</page>.*").expect("Invalid regex pattern"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<title>|标题[：:])\s*(.+?)(?:</title>|\n|$)").expect("Invalid regex pattern")
});
static SUBTITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<subtitle>|副标题[：:])\s*(.+?)(?:</subtitle>|\n|$)")
        .expect("Invalid regex pattern")
});

const COVER_MARKER: &str = "[封面]";
const CONTENT_MARKER: &str = "[内容]";
const SUMMARY_MARKER: &str = "[总结]";

/// Parses raw outline text into pages numbered 1..N in output order.
pub fn parse_outline(text: &str) -> Vec<Page> {
    let segments = match complete_segments(text) {
        segments if !segments.is_empty() => segments,
        _ => unclosed_segments(text),
    };

    let mut pages: Vec<Page> = Vec::with_capacity(segments.len());
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let next_number = pages.len() as u32 + 1;
        if let Some(page) = parse_single_page(segment, next_number) {
            pages.push(page);
        }
    }
    pages
}

/// Inner text of every complete `<page ...>...</page>` pair, in order.
pub fn complete_segments(text: &str) -> Vec<&str> {
    PAGE_PAIR
        .find_iter(text)
        .map(|m| {
            let matched = m.as_str();
            let body_start = PAGE_OPEN.find(matched).map(|open| open.end()).unwrap_or(0);
            let inner = &matched[body_start..];
            inner.strip_suffix("</page>").unwrap_or(inner)
        })
        .collect()
}

/// Fallback for open tags that were never closed: everything after each `<page ...>`,
/// cut at the first `</page>`. Text before the first open tag is dropped.
pub fn unclosed_segments(text: &str) -> Vec<&str> {
    PAGE_OPEN
        .split(text)
        .skip(1)
        .map(|fragment| match PAGE_CLOSE_AND_REST.find(fragment) {
            Some(close) => &fragment[..close.start()],
            None => fragment,
        })
        .collect()
}

fn parse_single_page(segment: &str, page_number: u32) -> Option<Page> {
    let lines: Vec<&str> = segment.lines().filter(|line| !line.trim().is_empty()).collect();
    let first_line = lines.first()?.trim();

    let mut page_type = detect_page_type(first_line);
    let has_marker = first_line.contains('[') && first_line.contains(']');
    let body_start = usize::from(has_marker);

    let content = lines[body_start..].join("\n").trim().to_string();
    if content.is_empty() {
        return None;
    }

    // An unmarked leading page is always the cover.
    if page_number == 1 && !has_marker {
        page_type = PageType::Cover;
    }

    let mut page = Page::new(page_number, page_type, content);
    page.title = extract_title(&page.content);
    page.subtitle = capture_trimmed(&SUBTITLE, &page.content);
    Some(page)
}

fn detect_page_type(first_line: &str) -> PageType {
    if first_line.contains(COVER_MARKER) {
        PageType::Cover
    } else if first_line.contains(SUMMARY_MARKER) {
        PageType::Summary
    } else if first_line.contains(CONTENT_MARKER) {
        PageType::Content
    } else if first_line.contains("<title>") {
        PageType::Cover
    } else {
        PageType::Content
    }
}

/// `标题` is a suffix of `副标题`, so label matches preceded by `副` are skipped.
fn extract_title(content: &str) -> Option<String> {
    TITLE
        .captures_iter(content)
        .find(|caps| {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
            !content[..whole].ends_with('副')
        })
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn capture_trimmed(pattern: &Regex, content: &str) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}
