// 内容文件写出与解析的集成测试

use chrono::NaiveDate;
use gridpress::core::serializer::{self, SerializeError};
use gridpress::core::parse_content;
use gridpress::models::{AttrValue, Column, Content, ContentType, Item, Row, Section};
use gridpress::plugins::PluginRegistry;
use pretty_assertions::assert_eq;

fn core_imports() -> Vec<String> {
    vec!["GridPress 2.0".to_string()]
}

fn single_column(items: Vec<Item>) -> Section {
    let mut column = Column::new(12);
    for item in items {
        column.append_item(item);
    }
    let mut row = Row::new();
    row.append_column(column);
    let mut section = Section::new(false);
    section.append_row(row);
    section
}

fn save(content: &Content) -> String {
    serializer::save(content, &PluginRegistry::with_builtin(), &core_imports()).unwrap()
}

#[test]
fn empty_excerpt_is_not_written() {
    let mut content = Content::new(ContentType::Post);
    content.title = "Hello".to_string();
    assert!(!save(&content).contains("excerpt:"));

    content.excerpt = "hi".to_string();
    assert!(save(&content).contains("    excerpt: \"hi\"\n"));
}

#[test]
fn url_replaces_extension() {
    let mut content = Content::new(ContentType::Page);
    content.source = "about.xml".to_string();
    assert_eq!(content.url(), "about.html");

    content.source = "legacy.qml".to_string();
    assert_eq!(content.url(), "legacy.html");
}

#[test]
fn writes_nested_blocks_with_four_space_indent() {
    let mut content = Content::new(ContentType::Page);
    content.title = "About".to_string();
    content.layout = "default".to_string();
    content.date = NaiveDate::from_ymd_opt(2024, 1, 2);
    content.append_section(single_column(vec![
        Item::new("Markdown").with_attribute("text", "# Hi"),
    ]));

    let expected = concat!(
        "import GridPress 2.0\n",
        "import Markdown 1.0\n",
        "\n",
        "Content {\n",
        "    title: \"About\"\n",
        "    layout: \"default\"\n",
        "    date: \"2024-01-02\"\n",
        "\n",
        "    Section {\n",
        "\n",
        "        Row {\n",
        "\n",
        "            Column {\n",
        "                span: 12\n",
        "                Markdown {\n",
        "                    text: \"# Hi\"\n",
        "                }\n",
        "            }\n",
        "        }\n",
        "    }\n",
        "}\n",
    );
    assert_eq!(save(&content), expected);
}

#[test]
fn imports_follow_first_seen_order_without_duplicates() {
    let mut content = Content::new(ContentType::Page);
    content.append_section(single_column(vec![
        Item::new("Math").with_attribute("formula", "x^2"),
        Item::text("<p>plain</p>"),
        Item::new("Markdown").with_attribute("text", "a"),
        Item::new("Math").with_attribute("formula", "y"),
    ]));

    let text = save(&content);
    let imports: Vec<&str> = text.lines().take_while(|l| l.starts_with("import ")).collect();
    assert_eq!(
        imports,
        vec!["import GridPress 2.0", "import Math 1.0", "import Markdown 1.0"]
    );
}

#[test]
fn missing_plugin_fails_import_emission() {
    let mut content = Content::new(ContentType::Page);
    content.append_section(single_column(vec![Item::new("Gallery")]));

    let result = serializer::save(&content, &PluginRegistry::with_builtin(), &core_imports());
    match result {
        Err(SerializeError::UnresolvedPlugin { tag }) => assert_eq!(tag, "Gallery"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn saved_content_parses_back_to_the_same_tree() {
    let mut content = Content::new(ContentType::Page);
    content.title = "Quotes \"and\" slashes \\".to_string();
    content.menu = "main".to_string();
    content.author = "Ada".to_string();
    content.keywords = "a, b".to_string();
    content.script = "&lt;script&gt;\n".to_string();
    content.layout = "wide".to_string();
    content.logo = "logo.png".to_string();
    content.language = "de".to_string();
    content.date = NaiveDate::from_ymd_opt(2023, 12, 31);
    content.attributes.insert("featured".to_string(), AttrValue::Flag(true));
    content.attributes.insert("order".to_string(), AttrValue::Number(3));
    content.attributes.insert("hero".to_string(), AttrValue::from("top\tleft"));

    let mut hero = single_column(vec![Item::text("<h1>Hi</h1>")]);
    hero.fullwidth = true;
    hero.css_class = "hero".to_string();
    hero.id = "top".to_string();
    content.append_section(hero);

    let mut row = Row::new();
    row.css_class = "split".to_string();
    let mut left = Column::new(4);
    left.append_item(Item::new("Markdown").with_attribute("text", "left"));
    let mut right = Column::new(8);
    right.css_class = "wide".to_string();
    right.append_item(
        Item::new("Math")
            .with_attribute("formula", "e^{i\\pi}")
            .with_attribute("inline", true),
    );
    row.append_column(left);
    row.append_column(right);
    let mut section = Section::new(false);
    section.append_row(row);
    content.append_section(section);

    let parsed = parse_content(&save(&content)).unwrap();
    assert_eq!(parsed, content);
}

fn save_error(content: &Content) -> SerializeError {
    match serializer::save(content, &PluginRegistry::with_builtin(), &core_imports()) {
        Err(e) => e,
        Ok(text) => panic!("expected an error, got:\n{}", text),
    }
}

#[test]
fn custom_attributes_cannot_shadow_builtin_fields() {
    for name in ["title", "layout", "date", "language"] {
        let mut content = Content::new(ContentType::Page);
        content.attributes.insert(name.to_string(), AttrValue::from("x"));
        match save_error(&content) {
            SerializeError::ReservedAttribute { name: reserved } => assert_eq!(reserved, name),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

#[test]
fn names_that_cannot_be_read_back_are_rejected() {
    for name in ["", "two words", "colon:", "brace{", "42", "-7"] {
        let mut content = Content::new(ContentType::Page);
        content.attributes.insert(name.to_string(), AttrValue::Flag(true));
        match save_error(&content) {
            SerializeError::InvalidName { name: invalid } => assert_eq!(invalid, name),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    let mut content = Content::new(ContentType::Page);
    content.append_section(single_column(vec![
        Item::new("Markdown").with_attribute("bad key", "x"),
    ]));
    assert!(matches!(save_error(&content), SerializeError::InvalidName { name } if name == "bad key"));

    let mut content = Content::new(ContentType::Page);
    content.append_section(single_column(vec![Item::new("My Widget")]));
    assert!(matches!(save_error(&content), SerializeError::InvalidName { name } if name == "My Widget"));
}

#[test]
fn column_spans_outside_the_grid_are_rejected() {
    for span in [0, 13, 255] {
        let mut column = Column::new(span);
        column.append_item(Item::text("x"));
        let mut row = Row::new();
        row.append_column(column);
        let mut section = Section::new(false);
        section.append_row(row);
        let mut content = Content::new(ContentType::Page);
        content.append_section(section);

        assert!(matches!(save_error(&content), SerializeError::InvalidSpan { span: s } if s == span));
    }
}

#[test]
fn dotted_and_dashed_names_survive_a_round_trip() {
    let mut content = Content::new(ContentType::Page);
    content.attributes.insert("og.image".to_string(), AttrValue::from("cover.png"));
    content.attributes.insert("nav-order".to_string(), AttrValue::Number(-2));
    content.append_section(single_column(vec![
        Item::new("Markdown").with_attribute("text", "x").with_attribute("data-id", "m1"),
    ]));

    let parsed = parse_content(&save(&content)).unwrap();
    assert_eq!(parsed, content);
}
