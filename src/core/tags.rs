use crate::models::Content;

/// 按遍历顺序收集内容中所有元素的标签，可能包含重复项
pub fn collect(content: &Content) -> Vec<String> {
    let mut tags = Vec::new();
    content.collect_tag_names(&mut tags);
    tags
}

/// 去重，保留第一次出现的顺序
pub fn unique(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

pub fn unique_tags(content: &Content) -> Vec<String> {
    unique(collect(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Item, Row, Section};

    fn content_with(tags: &[&str]) -> Content {
        let mut column = Column::new(12);
        for tag in tags {
            column.append_item(Item::new(*tag));
        }
        let mut row = Row::new();
        row.append_column(column);
        let mut section = Section::new(false);
        section.append_row(row);
        let mut content = Content::default();
        content.append_section(section);
        content
    }

    #[test]
    fn collects_every_occurrence_in_tree_order() {
        let content = content_with(&["gallery", "text", "gallery"]);
        assert_eq!(collect(&content), vec!["gallery", "text", "gallery"]);
    }

    #[test]
    fn unique_keeps_first_seen_order() {
        let content = content_with(&["gallery", "text", "gallery"]);
        assert_eq!(unique_tags(&content), vec!["gallery", "text"]);
    }

    #[test]
    fn builtin_text_contributes_no_tag() {
        let mut content = content_with(&["Markdown"]);
        content.sections[0].rows[0].columns[0].append_item(Item::text("<p>hi</p>"));
        assert_eq!(collect(&content), vec!["Markdown"]);
    }

    #[test]
    fn empty_tree_has_no_tags() {
        assert!(collect(&Content::default()).is_empty());
    }
}
