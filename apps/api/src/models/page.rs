use serde::{Deserialize, Serialize};

/// Role a page plays inside an outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Cover,
    #[default]
    Content,
    Summary,
}

impl PageType {
    /// Display label used inside image prompts.
    pub fn label(self) -> &'static str {
        match self {
            PageType::Cover => "封面",
            PageType::Content => "内容页",
            PageType::Summary => "总结页",
        }
    }
}

/// A single page of an outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_number: u32,
    #[serde(rename = "type")]
    pub page_type: PageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
}

impl Page {
    pub fn new(page_number: u32, page_type: PageType, content: impl Into<String>) -> Self {
        Self {
            page_number,
            page_type,
            title: None,
            subtitle: None,
            content: content.into(),
            image_prompt: None,
        }
    }

    pub fn is_cover(&self) -> bool {
        self.page_type == PageType::Cover
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_serializes_with_camel_case_and_type_field() {
        let page = Page::new(1, PageType::Cover, "春季穿搭");
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageNumber"], 1);
        assert_eq!(json["type"], "cover");
        assert_eq!(json["content"], "春季穿搭");
        assert!(json.get("title").is_none());
        assert!(json.get("imagePrompt").is_none());
    }

    #[test]
    fn test_page_deserializes_optional_fields() {
        let json = r#"{
            "pageNumber": 2,
            "type": "summary",
            "title": "总结",
            "content": "记得收藏"
        }"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert_eq!(page.page_number, 2);
        assert_eq!(page.page_type, PageType::Summary);
        assert_eq!(page.title.as_deref(), Some("总结"));
        assert!(page.subtitle.is_none());
    }

    #[test]
    fn test_unknown_page_type_is_rejected() {
        let json = r#"{"pageNumber": 1, "type": "appendix", "content": "x"}"#;
        let result: Result<Page, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
