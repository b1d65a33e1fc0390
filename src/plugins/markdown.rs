use super::ElementPlugin;
use crate::models::Item;
use crate::utils::markdown;

/// Markdown 元素：把 `text` 属性渲染成 HTML
#[derive(Debug, Default)]
pub struct MarkdownElement;

impl MarkdownElement {
    pub const NAME: &'static str = "markdown";
    pub const TAG: &'static str = "Markdown";

    pub fn new() -> Self {
        Self
    }
}

impl ElementPlugin for MarkdownElement {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn tag_name(&self) -> &str {
        Self::TAG
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn to_html(&self, item: &Item) -> String {
        let html = markdown::render(item.attribute("text").unwrap_or_default());
        match item.attribute("cssclass") {
            Some(class) if !class.is_empty() => {
                format!("<div class=\"{}\">{}</div>", class, html)
            }
            _ => html,
        }
    }
}
