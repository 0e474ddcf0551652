use std::path::Path;

use crate::models::Page;

/// Image prompt template. Replace: {page_type}, {theme}, {content}
pub const IMAGE_PROMPT_TEMPLATE: &str = "生成一张小红书风格的{page_type}图片。

主题: {theme}
页面类型: {page_type}
页面内容: {content}

要求:
1. 竖版 3:4 比例
2. 小红书爆款风格
3. 清新、精致、有设计感
4. 文字清晰可读
5. 排版美观，留白合理
6. 不要带有任何小红书的 logo 或水印
7. 确保竖屏显示正确，不要旋转或倒置";

/// Appended for non-cover pages once the cover exists.
pub const STYLE_REFERENCE_NOTE: &str = "\n\n参考风格: 请参考封面图片的风格保持一致";

/// Style guide served as a read-only prompt resource.
pub const IMAGE_GUIDE: &str = "小红书图片生成规范：
- 画面比例固定为竖版 3:4（1024x1365）
- 封面突出主标题，字号醒目，可配副标题
- 内容页以信息清晰为先，标题与正文层次分明
- 总结页收束要点，并加入点赞、收藏、关注等互动引导
- 全部页面沿用封面的配色与字体风格
- 画面清新精致，留白合理，不出现任何平台 logo 或水印
- 文字必须清晰可读，画面方向正确，不旋转不倒置";

/// Builds the upstream prompt for one page.
pub fn build_image_prompt(page: &Page, theme: &str, cover_image: Option<&Path>) -> String {
    // {content} last so page text is never re-scanned for placeholders.
    let mut prompt = IMAGE_PROMPT_TEMPLATE
        .replace("{page_type}", page.page_type.label())
        .replace("{theme}", theme)
        .replace("{content}", &page.content);

    if cover_image.is_some() && !page.is_cover() {
        prompt.push_str(STYLE_REFERENCE_NOTE);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageType;

    #[test]
    fn test_prompt_includes_label_theme_and_content() {
        let page = Page::new(2, PageType::Content, "白衬衫的三种穿法");
        let prompt = build_image_prompt(&page, "春季穿搭", None);
        assert!(prompt.contains("小红书风格的内容页图片"));
        assert!(prompt.contains("主题: 春季穿搭"));
        assert!(prompt.contains("页面内容: 白衬衫的三种穿法"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_prompt_lists_all_seven_constraints() {
        let page = Page::new(1, PageType::Cover, "x");
        let prompt = build_image_prompt(&page, "t", None);
        for marker in ["1. 竖版 3:4", "2. ", "3. ", "4. 文字清晰", "5. ", "6. 不要带有", "7. 确保竖屏"] {
            assert!(prompt.contains(marker), "missing {marker}");
        }
    }

    #[test]
    fn test_style_note_only_for_non_cover_with_reference() {
        let cover = Page::new(1, PageType::Cover, "封面");
        let content = Page::new(2, PageType::Content, "正文");
        let summary = Page::new(3, PageType::Summary, "总结");
        let reference = Path::new("/data/images/p/page_1.png");

        assert!(!build_image_prompt(&cover, "t", Some(reference)).contains("参考风格"));
        assert!(!build_image_prompt(&content, "t", None).contains("参考风格"));
        assert!(build_image_prompt(&content, "t", Some(reference)).ends_with(STYLE_REFERENCE_NOTE));
        assert!(build_image_prompt(&summary, "t", Some(reference)).contains("总结页"));
        assert!(build_image_prompt(&summary, "t", Some(reference)).contains("参考风格"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let page = Page::new(1, PageType::Summary, "记得收藏");
        assert_eq!(
            build_image_prompt(&page, "咖啡", None),
            build_image_prompt(&page, "咖啡", None)
        );
    }

    #[test]
    fn test_placeholder_text_in_content_is_kept_verbatim() {
        let page = Page::new(2, PageType::Content, "模板写法 {theme}");
        let prompt = build_image_prompt(&page, "咖啡", None);
        assert!(prompt.contains("页面内容: 模板写法 {theme}"));
    }
}
