//! 模板上下文：`site`、`theme`、菜单以及每个内容的 `page` 变量

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::models::{Attributes, Content, ContentType, MenuItem, SiteModel};
use crate::plugins::PluginRegistry;

/// 渲染后的菜单项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    pub title: String,
    pub url: String,
    pub icon: String,
    /// 拼接好的 `name="value"` 属性串
    pub attributes: String,
    pub items: Vec<MenuEntry>,
    #[serde(rename = "hasItems")]
    pub has_items: bool,
}

impl From<&MenuItem> for MenuEntry {
    fn from(item: &MenuItem) -> Self {
        let items: Vec<MenuEntry> = item.items.iter().map(MenuEntry::from).collect();
        Self {
            title: item.title.clone(),
            url: item.url.clone(),
            icon: item.icon.clone(),
            attributes: item.attribute_string(),
            has_items: !items.is_empty(),
            items,
        }
    }
}

/// 整个站点只计算一次、每个内容渲染时复用的上下文
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub site: Value,
    pub theme: Value,
    pub menus: HashMap<String, Vec<MenuEntry>>,
}

impl SiteContext {
    pub fn build(site: &SiteModel, registry: &PluginRegistry) -> Self {
        let menus = site
            .menus
            .iter()
            .map(|menu| {
                let items = menu.items.iter().map(MenuEntry::from).collect();
                (menu.name.clone(), items)
            })
            .collect::<HashMap<_, _>>();
        debug!("Built {} menus", menus.len());

        Self {
            site: Value::Object(site_vars(site)),
            theme: Value::Object(theme_vars(site, registry)),
            menus,
        }
    }

    /// 某个菜单的菜单项，找不到时为空
    pub fn menu_items(&self, name: &str) -> &[MenuEntry] {
        self.menus.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// 布局模板使用的 `page` 变量
    pub fn page_vars(&self, content: &Content) -> Value {
        let mut page = content_summary(content);
        page.insert(
            "script".to_string(),
            Value::String(html_escape::decode_html_entities(&content.script).into_owned()),
        );
        page.insert("excerpt".to_string(), Value::String(excerpt(content)));
        page.insert("menuitems".to_string(), json!(self.menu_items(&content.menu)));
        Value::Object(page)
    }

    /// 元素 HTML 二次渲染时使用的上下文：完整的内容对象与站点
    pub fn content_scope(&self, content: &Content) -> Value {
        let mut page = match serde_json::to_value(content) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        page.insert("url".to_string(), Value::String(content.url()));
        page.insert("date".to_string(), Value::String(date_string(content)));
        json!({
            "page": page,
            "site": self.site,
        })
    }
}

/// `site` 命名空间
pub fn site_vars(site: &SiteModel) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("title".into(), json!(site.title));
    vars.insert("description".into(), json!(site.description));
    vars.insert("theme".into(), json!(site.theme));
    vars.insert("copyright".into(), json!(site.copyright));
    vars.insert("source".into(), json!(site.source_path.to_string_lossy()));
    vars.insert("keywords".into(), json!(site.keywords));
    vars.insert("author".into(), json!(site.author));
    vars.insert("logo".into(), json!(site.logo));
    vars.insert(
        "pages".into(),
        Value::Array(site.pages.iter().map(|c| Value::Object(content_summary(c))).collect()),
    );
    vars.insert(
        "posts".into(),
        Value::Array(site.posts.iter().map(|c| Value::Object(content_summary(c))).collect()),
    );
    for (name, value) in &site.attributes {
        vars.insert(name.clone(), json!(value));
    }
    vars
}

/// 页面或文章摘要，自定义属性合并在最后
pub fn content_summary(content: &Content) -> Map<String, Value> {
    let mut cm = Map::new();
    cm.insert("author".into(), json!(content.author));
    cm.insert("date".into(), json!(date_string(content)));
    if content.content_type == ContentType::Post {
        cm.insert("excerpt".into(), json!(content.excerpt));
    }
    cm.insert("layout".into(), json!(content.layout));
    cm.insert("menu".into(), json!(content.menu));
    cm.insert("source".into(), json!(content.source));
    cm.insert("title".into(), json!(content.title));
    cm.insert("url".into(), json!(content.url()));
    cm.insert("logo".into(), json!(content.logo));
    cm.insert("keywords".into(), json!(content.keywords));
    cm.insert("script".into(), json!(content.script));
    merge_attributes(&mut cm, &content.attributes);
    cm
}

/// `theme` 命名空间，没有启用的主题编辑插件时为空
pub fn theme_vars(site: &SiteModel, registry: &PluginRegistry) -> Map<String, Value> {
    match registry.active_theme_editor() {
        Some(editor) => match editor.theme_vars(&site.source_path) {
            Ok(vars) => vars,
            Err(e) => {
                warn!("读取主题变量失败 ({}): {:#}", editor.name(), e);
                Map::new()
            }
        },
        None => Map::new(),
    }
}

fn merge_attributes(vars: &mut Map<String, Value>, attributes: &Attributes) {
    for (name, value) in attributes {
        vars.insert(name.clone(), json!(value));
    }
}

fn date_string(content: &Content) -> String {
    content
        .date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn excerpt(content: &Content) -> String {
    match content.content_type {
        ContentType::Post => content.excerpt.clone(),
        ContentType::Page => String::new(),
    }
}
