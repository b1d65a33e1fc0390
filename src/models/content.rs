use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::serializer::{write_attribute, write_date, write_flag, write_str};
use crate::models::preset::ColumnPreset;

/// 核心内置元素的标签名，不需要插件
pub const TEXT_TAG: &str = "Text";

/// 内容类型：页面或文章
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Page,
    Post,
}

impl ContentType {
    /// 内容文件所在的子目录
    pub fn folder(&self) -> &'static str {
        match self {
            ContentType::Page => "pages",
            ContentType::Post => "posts",
        }
    }
}

/// 属性值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl AttrValue {
    /// 空字符串和 false 视为未设置，不写入文件
    pub fn is_set(&self) -> bool {
        match self {
            AttrValue::Flag(flag) => *flag,
            AttrValue::Number(_) => true,
            AttrValue::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Flag(flag) => write!(f, "{}", flag),
            AttrValue::Number(number) => write!(f, "{}", number),
            AttrValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value)
    }
}

/// 按键排序的属性表
pub type Attributes = BTreeMap<String, AttrValue>;

/// 在列表内移动子节点：先移除，再按移除后的列表插入到目标位置
fn move_child<T>(children: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= children.len() {
        return false;
    }
    let child = children.remove(from);
    let to = to.min(children.len());
    children.insert(to, child);
    true
}

fn remove_child<T>(children: &mut Vec<T>, index: usize) -> Option<T> {
    if index < children.len() {
        Some(children.remove(index))
    } else {
        None
    }
}

/// 一个页面或文章的根节点
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub title: String,
    pub menu: String,
    pub author: String,
    pub excerpt: String,
    pub keywords: String,
    pub script: String,
    pub layout: String,
    pub date: Option<NaiveDate>,
    pub logo: String,
    pub language: String,
    /// 源文件名，例如 `about.xml`
    pub source: String,
    pub content_type: ContentType,
    /// 自定义属性
    pub attributes: Attributes,
    pub sections: Vec<Section>,
}

impl Content {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            ..Default::default()
        }
    }

    /// 输出路径：源文件名的扩展名换成 `.html`
    pub fn url(&self) -> String {
        if self.source.is_empty() {
            return String::new();
        }
        Path::new(&self.source)
            .with_extension("html")
            .to_string_lossy()
            .to_string()
    }

    /// 根据标题生成新内容的源文件名
    pub fn source_from_title(title: &str) -> String {
        format!("{}.xml", slug::slugify(title))
    }

    pub fn append_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn remove_section(&mut self, index: usize) -> Option<Section> {
        remove_child(&mut self.sections, index)
    }

    /// 移动区块；`new_pos` 以移除之后的列表为准
    pub fn change_section_pos(&mut self, index: usize, new_pos: usize) -> bool {
        move_child(&mut self.sections, index, new_pos)
    }

    /// 按深度优先顺序遍历所有元素
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sections
            .iter()
            .flat_map(|section| section.rows.iter())
            .flat_map(|row| row.columns.iter())
            .flat_map(|column| column.items.iter())
    }

    /// 收集所有元素的标签名（可能重复）
    pub fn collect_tag_names(&self, tags: &mut Vec<String>) {
        for section in &self.sections {
            section.collect_tag_names(tags);
        }
    }

    /// 写出 `Content { ... }` 根块
    pub fn save<W: Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        writeln!(out, "{:indent$}Content {{", "", indent = indent)?;
        let inner = indent + 4;
        write_str(out, inner, "title", &self.title)?;
        write_str(out, inner, "menu", &self.menu)?;
        write_str(out, inner, "author", &self.author)?;
        write_str(out, inner, "keywords", &self.keywords)?;
        write_str(out, inner, "script", &self.script)?;
        write_str(out, inner, "layout", &self.layout)?;
        write_date(out, inner, "date", self.date)?;
        write_str(out, inner, "logo", &self.logo)?;
        write_str(out, inner, "excerpt", &self.excerpt)?;
        write_str(out, inner, "language", &self.language)?;

        for (name, value) in &self.attributes {
            write_attribute(out, inner, name, value)?;
        }

        for section in &self.sections {
            section.save(out, inner)?;
        }
        writeln!(out, "{:indent$}}}", "", indent = indent)
    }
}

/// 区块：由若干行组成
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub fullwidth: bool,
    pub css_class: String,
    pub id: String,
    pub rows: Vec<Row>,
}

impl Section {
    pub fn new(fullwidth: bool) -> Self {
        Self {
            fullwidth,
            ..Default::default()
        }
    }

    pub fn append_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn remove_row(&mut self, index: usize) -> Option<Row> {
        remove_child(&mut self.rows, index)
    }

    pub fn change_row_pos(&mut self, index: usize, new_pos: usize) -> bool {
        move_child(&mut self.rows, index, new_pos)
    }

    pub fn collect_tag_names(&self, tags: &mut Vec<String>) {
        for row in &self.rows {
            row.collect_tag_names(tags);
        }
    }

    pub fn save<W: Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "{:indent$}Section {{", "", indent = indent)?;
        write_flag(out, indent + 4, "fullwidth", self.fullwidth)?;
        write_str(out, indent + 4, "cssclass", &self.css_class)?;
        write_str(out, indent + 4, "id", &self.id)?;
        for row in &self.rows {
            row.save(out, indent + 4)?;
        }
        writeln!(out, "{:indent$}}}", "", indent = indent)
    }
}

/// 行：由若干列组成
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub css_class: String,
    pub columns: Vec<Column>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn remove_column(&mut self, index: usize) -> Option<Column> {
        remove_child(&mut self.columns, index)
    }

    pub fn change_column_pos(&mut self, index: usize, new_pos: usize) -> bool {
        move_child(&mut self.columns, index, new_pos)
    }

    /// 按预设比例追加列
    pub fn insert_columns(&mut self, preset: ColumnPreset) {
        for span in preset.spans() {
            self.columns.push(Column::new(*span));
        }
    }

    pub fn span_total(&self) -> u32 {
        self.columns.iter().map(|column| u32::from(column.span)).sum()
    }

    /// 列宽之和不超过 12
    pub fn is_balanced(&self) -> bool {
        self.span_total() <= 12
    }

    pub fn collect_tag_names(&self, tags: &mut Vec<String>) {
        for column in &self.columns {
            column.collect_tag_names(tags);
        }
    }

    pub fn save<W: Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "{:indent$}Row {{", "", indent = indent)?;
        write_str(out, indent + 4, "cssclass", &self.css_class)?;
        for column in &self.columns {
            column.save(out, indent + 4)?;
        }
        writeln!(out, "{:indent$}}}", "", indent = indent)
    }
}

/// 列：占 12 栅格中的 `span` 格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub span: u8,
    pub css_class: String,
    pub items: Vec<Item>,
}

impl Default for Column {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Column {
    pub fn new(span: u8) -> Self {
        Self {
            span,
            css_class: String::new(),
            items: Vec::new(),
        }
    }

    pub fn append_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, index: usize) -> Option<Item> {
        remove_child(&mut self.items, index)
    }

    pub fn change_item_pos(&mut self, index: usize, new_pos: usize) -> bool {
        move_child(&mut self.items, index, new_pos)
    }

    pub fn collect_tag_names(&self, tags: &mut Vec<String>) {
        for item in &self.items {
            item.collect_tag_names(tags);
        }
    }

    pub fn save<W: Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "{:indent$}Column {{", "", indent = indent)?;
        write_attribute(out, indent + 4, "span", &AttrValue::Number(i64::from(self.span)))?;
        write_str(out, indent + 4, "cssclass", &self.css_class)?;
        for item in &self.items {
            item.save(out, indent + 4)?;
        }
        writeln!(out, "{:indent$}}}", "", indent = indent)
    }
}

/// 叶子元素；具体的 HTML 由对应标签的插件生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub tag: String,
    pub attributes: Attributes,
}

impl Item {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
        }
    }

    /// 纯文本/HTML 元素
    pub fn text(html: impl Into<String>) -> Self {
        Self::new(TEXT_TAG).with_attribute("text", html.into())
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttrValue::as_str)
    }

    pub fn is_builtin(&self) -> bool {
        self.tag == TEXT_TAG
    }

    /// 需要插件的元素贡献其标签名，内置元素不贡献
    pub fn tag_name(&self) -> Option<&str> {
        if self.is_builtin() {
            None
        } else {
            Some(&self.tag)
        }
    }

    pub fn collect_tag_names(&self, tags: &mut Vec<String>) {
        if let Some(tag) = self.tag_name() {
            tags.push(tag.to_string());
        }
    }

    pub fn save<W: Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        writeln!(out, "{:indent$}{} {{", "", self.tag, indent = indent)?;
        for (name, value) in &self.attributes {
            write_attribute(out, indent + 4, name, value)?;
        }
        writeln!(out, "{:indent$}}}", "", indent = indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(section_ids: &[&str]) -> Content {
        let mut content = Content::new(ContentType::Page);
        for id in section_ids {
            let mut section = Section::new(false);
            section.id = id.to_string();
            content.append_section(section);
        }
        content
    }

    fn order(content: &Content) -> Vec<&str> {
        content.sections.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn move_front_to_back_and_back_to_front() {
        let mut content = ids(&["a", "b", "c", "d"]);
        assert!(content.change_section_pos(0, 3));
        assert_eq!(order(&content), vec!["b", "c", "d", "a"]);

        assert!(content.change_section_pos(3, 0));
        assert_eq!(order(&content), vec!["a", "b", "c", "d"]);

        // 目标位置以移除后的列表计算
        assert!(content.change_section_pos(1, 2));
        assert_eq!(order(&content), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn target_past_the_end_appends() {
        let mut content = ids(&["a", "b", "c"]);
        assert!(content.change_section_pos(0, 99));
        assert_eq!(order(&content), vec!["b", "c", "a"]);
    }

    #[test]
    fn source_out_of_range_changes_nothing() {
        let mut content = ids(&["a", "b"]);
        assert!(!content.change_section_pos(2, 0));
        assert_eq!(order(&content), vec!["a", "b"]);

        let mut empty = Content::new(ContentType::Post);
        assert!(!empty.change_section_pos(0, 0));
        assert!(empty.remove_section(0).is_none());
    }

    #[test]
    fn rows_columns_and_items_move_the_same_way() {
        let mut column = Column::new(12);
        column.append_item(Item::text("1"));
        column.append_item(Item::text("2"));
        column.append_item(Item::text("3"));
        assert!(column.change_item_pos(2, 0));
        let texts: Vec<_> = column.items.iter().filter_map(|i| i.attribute("text")).collect();
        assert_eq!(texts, vec!["3", "1", "2"]);

        let mut row = Row::new();
        row.append_column(Column::new(4));
        row.append_column(Column::new(8));
        assert!(row.change_column_pos(0, 1));
        assert_eq!(row.columns.iter().map(|c| c.span).collect::<Vec<_>>(), vec![8, 4]);
        assert!(!row.change_column_pos(5, 0));

        let mut section = Section::new(true);
        section.append_row(Row::new());
        assert!(section.change_row_pos(0, 0));
        assert_eq!(section.rows.len(), 1);
        assert!(section.remove_row(1).is_none());
    }
}
