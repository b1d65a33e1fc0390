//! 内容文件解析器。
//!
//! 格式为若干行 `import <模块> <版本>`，随后是唯一的 `Content { ... }` 根块。
//! 块内每行是 `名称: 值` 属性或嵌套子块，对空白不敏感，支持 `//` 行注释。

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{AttrValue, Attributes, Column, Content, Item, Row, Section};

/// 解析错误
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("第 {line} 行: 无效的 import 声明: {text}")]
    InvalidImport { line: usize, text: String },

    #[error("第 {line} 行: 字符串没有结束")]
    UnterminatedString { line: usize },

    #[error("第 {line} 行: 意外的字符 '{ch}'")]
    UnexpectedChar { line: usize, ch: char },

    #[error("第 {line} 行: 期望 {expected}, 实际为 {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("文件意外结束: 期望 {expected}")]
    UnexpectedEof { expected: String },

    #[error("第 {line} 行: {parent} 中不允许出现 {child}")]
    InvalidChild {
        line: usize,
        parent: String,
        child: String,
    },

    #[error("第 {line} 行: 属性 {name} 的值无效: {message}")]
    InvalidValue {
        line: usize,
        name: String,
        message: String,
    },

    #[error("第 {line} 行: {block} 不支持属性 {name}")]
    UnknownAttribute {
        line: usize,
        block: String,
        name: String,
    },
}

/// 文件头部的 import 声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub version: String,
}

/// 一个完整的内容文件
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub imports: Vec<Import>,
    pub content: Content,
}

/// 只解析出内容树
pub fn parse_content(text: &str) -> Result<Content, ParseError> {
    parse_document(text).map(|document| document.content)
}

pub fn parse_document(text: &str) -> Result<Document, ParseError> {
    let mut imports = Vec::new();
    let mut offset = 0;
    let mut line_no = 1;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            line_no += 1;
            continue;
        }
        match trimmed.strip_prefix("import ") {
            Some(rest) => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 2 {
                    return Err(ParseError::InvalidImport {
                        line: line_no,
                        text: trimmed.to_string(),
                    });
                }
                imports.push(Import {
                    module: parts[0].to_string(),
                    version: parts[1].to_string(),
                });
                offset += line.len();
                line_no += 1;
            }
            None => break,
        }
    }

    let tokens = tokenize(&text[offset..], line_no)?;
    let mut parser = Parser { tokens, pos: 0 };
    let root = parser.block()?;
    if let Some((token, line)) = parser.tokens.get(parser.pos) {
        return Err(ParseError::UnexpectedToken {
            line: *line,
            expected: "文件结束".to_string(),
            found: token.describe(),
        });
    }

    Ok(Document {
        imports,
        content: build_content(root)?,
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Open,
    Close,
    Colon,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{}'", name),
            Token::Str(_) => "字符串".to_string(),
            Token::Int(n) => n.to_string(),
            Token::Open => "'{'".to_string(),
            Token::Close => "'}'".to_string(),
            Token::Colon => "':'".to_string(),
        }
    }
}

/// `Content` 块的内置字段名，自定义属性不能使用
pub(crate) const CONTENT_FIELDS: [&str; 10] = [
    "title", "menu", "author", "keywords", "script", "layout", "logo", "excerpt", "language",
    "date",
];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// 能作为块名或属性名读回的名称：非空、只含单词字符、且不会被读成整数
pub(crate) fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_word_char) && name.parse::<i64>().is_err()
}

fn tokenize(text: &str, first_line: usize) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut line = first_line;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '{' => tokens.push((Token::Open, line)),
            '}' => tokens.push((Token::Close, line)),
            ':' => tokens.push((Token::Colon, line)),
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' => {
                let start = line;
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('r') => value.push('\r'),
                            Some('t') => value.push('\t'),
                            Some(other) => value.push(other),
                            None => return Err(ParseError::UnterminatedString { line: start }),
                        },
                        Some(other) => {
                            if other == '\n' {
                                line += 1;
                            }
                            value.push(other);
                        }
                        None => return Err(ParseError::UnterminatedString { line: start }),
                    }
                }
                tokens.push((Token::Str(value), start));
            }
            c if is_word_char(c) => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                let token = match word.parse::<i64>() {
                    Ok(number) => Token::Int(number),
                    Err(_) => Token::Ident(word),
                };
                tokens.push((token, line));
            }
            other => return Err(ParseError::UnexpectedChar { line, ch: other }),
        }
    }
    Ok(tokens)
}

/// 未分类的块，之后再转换成具体节点
struct Block {
    name: String,
    line: usize,
    attributes: Vec<(String, AttrValue, usize)>,
    children: Vec<Block>,
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn next(&mut self, expected: &str) -> Result<(Token, usize), ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| ParseError::UnexpectedEof {
            expected: expected.to_string(),
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn ident(&mut self) -> Result<(String, usize), ParseError> {
        match self.next("名称")? {
            (Token::Ident(name), line) => Ok((name, line)),
            (other, line) => Err(ParseError::UnexpectedToken {
                line,
                expected: "名称".to_string(),
                found: other.describe(),
            }),
        }
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        let (name, line) = self.ident()?;
        match self.next("'{'")? {
            (Token::Open, _) => {}
            (other, line) => {
                return Err(ParseError::UnexpectedToken {
                    line,
                    expected: "'{'".to_string(),
                    found: other.describe(),
                })
            }
        }
        self.block_body(name, line)
    }

    fn block_body(&mut self, name: String, line: usize) -> Result<Block, ParseError> {
        let mut block = Block {
            name,
            line,
            attributes: Vec::new(),
            children: Vec::new(),
        };

        loop {
            match self.next("'}'")? {
                (Token::Close, _) => return Ok(block),
                (Token::Ident(child), child_line) => match self.next("':' 或 '{'")? {
                    (Token::Colon, _) => {
                        let value = self.value(&child)?;
                        block.attributes.push((child, value, child_line));
                    }
                    (Token::Open, _) => block.children.push(self.block_body(child, child_line)?),
                    (other, line) => {
                        return Err(ParseError::UnexpectedToken {
                            line,
                            expected: "':' 或 '{'".to_string(),
                            found: other.describe(),
                        })
                    }
                },
                (other, line) => {
                    return Err(ParseError::UnexpectedToken {
                        line,
                        expected: "属性或子块".to_string(),
                        found: other.describe(),
                    })
                }
            }
        }
    }

    fn value(&mut self, name: &str) -> Result<AttrValue, ParseError> {
        match self.next("属性值")? {
            (Token::Str(text), _) => Ok(AttrValue::Text(text)),
            (Token::Int(number), _) => Ok(AttrValue::Number(number)),
            (Token::Ident(word), line) => match word.as_str() {
                "true" => Ok(AttrValue::Flag(true)),
                "false" => Ok(AttrValue::Flag(false)),
                _ => Err(ParseError::InvalidValue {
                    line,
                    name: name.to_string(),
                    message: format!("无法识别的值 {}", word),
                }),
            },
            (other, line) => Err(ParseError::UnexpectedToken {
                line,
                expected: "属性值".to_string(),
                found: other.describe(),
            }),
        }
    }
}

fn expect_text(name: &str, value: AttrValue, line: usize) -> Result<String, ParseError> {
    match value {
        AttrValue::Text(text) => Ok(text),
        other => Err(ParseError::InvalidValue {
            line,
            name: name.to_string(),
            message: format!("期望字符串, 实际为 {}", other),
        }),
    }
}

fn expect_flag(name: &str, value: AttrValue, line: usize) -> Result<bool, ParseError> {
    match value {
        AttrValue::Flag(flag) => Ok(flag),
        other => Err(ParseError::InvalidValue {
            line,
            name: name.to_string(),
            message: format!("期望布尔值, 实际为 {}", other),
        }),
    }
}

fn expect_span(name: &str, value: AttrValue, line: usize) -> Result<u8, ParseError> {
    match value {
        AttrValue::Number(span) if (1..=12).contains(&span) => Ok(span as u8),
        other => Err(ParseError::InvalidValue {
            line,
            name: name.to_string(),
            message: format!("span 必须是 1 到 12 之间的整数, 实际为 {}", other),
        }),
    }
}

fn expect_children(block: &Block, child: &str) -> Result<(), ParseError> {
    match block.children.iter().find(|c| c.name != child) {
        Some(invalid) => Err(ParseError::InvalidChild {
            line: invalid.line,
            parent: block.name.clone(),
            child: invalid.name.clone(),
        }),
        None => Ok(()),
    }
}

fn unknown_attribute(block: &str, name: String, line: usize) -> ParseError {
    ParseError::UnknownAttribute {
        line,
        block: block.to_string(),
        name,
    }
}

fn build_content(root: Block) -> Result<Content, ParseError> {
    if root.name != "Content" {
        return Err(ParseError::UnexpectedToken {
            line: root.line,
            expected: "'Content'".to_string(),
            found: format!("'{}'", root.name),
        });
    }
    expect_children(&root, "Section")?;

    let mut content = Content::default();
    for (name, value, line) in root.attributes {
        match name.as_str() {
            "title" => content.title = expect_text(&name, value, line)?,
            "menu" => content.menu = expect_text(&name, value, line)?,
            "author" => content.author = expect_text(&name, value, line)?,
            "keywords" => content.keywords = expect_text(&name, value, line)?,
            "script" => content.script = expect_text(&name, value, line)?,
            "layout" => content.layout = expect_text(&name, value, line)?,
            "logo" => content.logo = expect_text(&name, value, line)?,
            "excerpt" => content.excerpt = expect_text(&name, value, line)?,
            "language" => content.language = expect_text(&name, value, line)?,
            "date" => {
                let text = expect_text(&name, value, line)?;
                let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
                    ParseError::InvalidValue {
                        line,
                        name: name.clone(),
                        message: e.to_string(),
                    }
                })?;
                content.date = Some(date);
            }
            _ => {
                content.attributes.insert(name, value);
            }
        }
    }

    for child in root.children {
        content.append_section(build_section(child)?);
    }
    Ok(content)
}

fn build_section(block: Block) -> Result<Section, ParseError> {
    expect_children(&block, "Row")?;
    let mut section = Section::default();
    for (name, value, line) in block.attributes {
        match name.as_str() {
            "fullwidth" => section.fullwidth = expect_flag(&name, value, line)?,
            "cssclass" => section.css_class = expect_text(&name, value, line)?,
            "id" => section.id = expect_text(&name, value, line)?,
            _ => return Err(unknown_attribute("Section", name, line)),
        }
    }
    for child in block.children {
        section.append_row(build_row(child)?);
    }
    Ok(section)
}

fn build_row(block: Block) -> Result<Row, ParseError> {
    expect_children(&block, "Column")?;
    let mut row = Row::new();
    for (name, value, line) in block.attributes {
        match name.as_str() {
            "cssclass" => row.css_class = expect_text(&name, value, line)?,
            _ => return Err(unknown_attribute("Row", name, line)),
        }
    }
    for child in block.children {
        row.append_column(build_column(child)?);
    }
    Ok(row)
}

fn build_column(block: Block) -> Result<Column, ParseError> {
    let mut column = Column::default();
    for (name, value, line) in block.attributes {
        match name.as_str() {
            "span" => column.span = expect_span(&name, value, line)?,
            "cssclass" => column.css_class = expect_text(&name, value, line)?,
            _ => return Err(unknown_attribute("Column", name, line)),
        }
    }
    for child in block.children {
        column.append_item(build_item(child)?);
    }
    Ok(column)
}

fn build_item(block: Block) -> Result<Item, ParseError> {
    if let Some(nested) = block.children.first() {
        return Err(ParseError::InvalidChild {
            line: nested.line,
            parent: block.name,
            child: nested.name.clone(),
        });
    }
    let mut attributes = Attributes::new();
    for (name, value, _) in block.attributes {
        attributes.insert(name, value);
    }
    Ok(Item {
        tag: block.name,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"import GridPress 2.0
import Markdown 1.0

Content {
    title: "About \"us\""
    layout: "default"
    date: "2024-03-01"
    featured: true

    Section {
        fullwidth: true

        Row {

            Column {
                span: 6
                Markdown {
                    text: "line one\nline two"
                }
            }

            Column {
                span: 6
                // 纯文本
                Text {
                    text: "<p>hi</p>"
                }
            }
        }
    }
}
"#;

    #[test]
    fn parses_imports_and_tree() {
        let document = parse_document(SAMPLE).unwrap();
        assert_eq!(
            document.imports,
            vec![
                Import { module: "GridPress".into(), version: "2.0".into() },
                Import { module: "Markdown".into(), version: "1.0".into() },
            ]
        );

        let content = document.content;
        assert_eq!(content.title, "About \"us\"");
        assert_eq!(content.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(content.attributes.get("featured"), Some(&AttrValue::Flag(true)));

        let section = &content.sections[0];
        assert!(section.fullwidth);
        let columns = &section.rows[0].columns;
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].items[0].tag, "Markdown");
        assert_eq!(columns[0].items[0].attribute("text"), Some("line one\nline two"));
        assert_eq!(columns[1].items[0].attribute("text"), Some("<p>hi</p>"));
    }

    #[test]
    fn empty_content_block() {
        let content = parse_content("Content {\n}\n").unwrap();
        assert_eq!(content, Content::default());
    }

    #[test]
    fn rejects_rows_directly_under_content() {
        let err = parse_content("Content {\n    Row {\n    }\n}\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidChild { line: 2, .. }));
    }

    #[test]
    fn rejects_out_of_range_span() {
        let text = "Content {\n Section {\n  Row {\n   Column {\n    span: 13\n   }\n  }\n }\n}\n";
        let err = parse_content(text).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { line: 5, .. }));
    }

    #[test]
    fn reports_unterminated_string() {
        let err = parse_content("Content {\n    title: \"oops\n}\n").unwrap_err();
        assert_eq!(err, ParseError::UnterminatedString { line: 2 });
    }

    #[test]
    fn reports_missing_close() {
        let err = parse_content("Content {\n    title: \"x\"\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }
}
