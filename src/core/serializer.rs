//! 内容文件的写出：import 声明加上 `Content { ... }` 块。
//!
//! 标量属性只在非空、非 false 时写出；字符串用双引号并转义，
//! 布尔值只写 `true`，日期写成 `yyyy-MM-dd`。

use std::fmt::{self, Write};

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::parser::{is_identifier, CONTENT_FIELDS};
use crate::core::tags;
use crate::models::{AttrValue, Attributes, Content};
use crate::plugins::PluginRegistry;

/// 序列化错误
#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("没有插件提供标签 {tag}")]
    UnresolvedPlugin { tag: String },

    #[error("自定义属性 {name} 与内置字段重名")]
    ReservedAttribute { name: String },

    #[error("名称 {name:?} 无法写成可读回的标识符")]
    InvalidName { name: String },

    #[error("列宽 {span} 不在 1 到 12 之间")]
    InvalidSpan { span: u8 },

    #[error("写入失败: {0}")]
    Format(#[from] fmt::Error),
}

/// 把内容序列化为文本，包括所有 import 声明
pub fn save(
    content: &Content,
    registry: &PluginRegistry,
    core_imports: &[String],
) -> Result<String, SerializeError> {
    validate(content)?;

    let mut out = String::with_capacity(4096);
    for import in core_imports {
        writeln!(out, "import {}", import)?;
    }

    for tag in tags::unique_tags(content) {
        let plugin = registry
            .resolve(&tag)
            .ok_or_else(|| SerializeError::UnresolvedPlugin { tag: tag.clone() })?;
        plugin.write_import(&mut out)?;
    }

    out.push('\n');
    content.save(&mut out, 0)?;
    Ok(out)
}

/// 检查内容写出后能否原样读回
pub fn validate(content: &Content) -> Result<(), SerializeError> {
    for name in content.attributes.keys() {
        if CONTENT_FIELDS.contains(&name.as_str()) {
            return Err(SerializeError::ReservedAttribute { name: name.clone() });
        }
    }
    check_names(&content.attributes)?;

    for column in content
        .sections
        .iter()
        .flat_map(|s| s.rows.iter())
        .flat_map(|r| r.columns.iter())
    {
        if !(1..=12).contains(&column.span) {
            return Err(SerializeError::InvalidSpan { span: column.span });
        }
        for item in &column.items {
            if !is_identifier(&item.tag) {
                return Err(SerializeError::InvalidName {
                    name: item.tag.clone(),
                });
            }
            check_names(&item.attributes)?;
        }
    }
    Ok(())
}

fn check_names(attributes: &Attributes) -> Result<(), SerializeError> {
    match attributes.keys().find(|name| !is_identifier(name)) {
        Some(name) => Err(SerializeError::InvalidName { name: name.clone() }),
        None => Ok(()),
    }
}

/// 转义字符串中的引号、反斜杠和控制字符
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn write_attribute<W: Write>(
    out: &mut W,
    indent: usize,
    name: &str,
    value: &AttrValue,
) -> fmt::Result {
    if !value.is_set() {
        return Ok(());
    }
    match value {
        AttrValue::Text(text) => {
            writeln!(out, "{:indent$}{}: \"{}\"", "", name, escape(text), indent = indent)
        }
        AttrValue::Flag(_) => writeln!(out, "{:indent$}{}: true", "", name, indent = indent),
        AttrValue::Number(number) => {
            writeln!(out, "{:indent$}{}: {}", "", name, number, indent = indent)
        }
    }
}

pub fn write_str<W: Write>(out: &mut W, indent: usize, name: &str, value: &str) -> fmt::Result {
    if value.is_empty() {
        return Ok(());
    }
    writeln!(out, "{:indent$}{}: \"{}\"", "", name, escape(value), indent = indent)
}

pub fn write_flag<W: Write>(out: &mut W, indent: usize, name: &str, value: bool) -> fmt::Result {
    if !value {
        return Ok(());
    }
    writeln!(out, "{:indent$}{}: true", "", name, indent = indent)
}

pub fn write_date<W: Write>(
    out: &mut W,
    indent: usize,
    name: &str,
    value: Option<NaiveDate>,
) -> fmt::Result {
    match value {
        Some(date) => writeln!(
            out,
            "{:indent$}{}: \"{}\"",
            "",
            name,
            date.format("%Y-%m-%d"),
            indent = indent
        ),
        None => Ok(()),
    }
}
