use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::models::Item;

mod error;
pub mod markdown;
pub mod math;
pub mod theme_settings;

pub use error::PluginError;
pub use markdown::MarkdownElement;
pub use math::MathElement;
pub use theme_settings::SettingsThemeEditor;

/// 元素插件：按标签名提供某种叶子元素的渲染能力
pub trait ElementPlugin: Send + Sync {
    /// 获取插件名称
    fn name(&self) -> &str;

    /// 元素在内容文件中的块名
    fn tag_name(&self) -> &str;

    /// 获取插件版本
    fn version(&self) -> &str;

    /// import 声明使用的模块名
    fn module(&self) -> &str {
        self.tag_name()
    }

    /// 生成元素的 HTML 片段
    fn to_html(&self, item: &Item) -> String;

    /// 页面需要的样式块
    fn styles(&self) -> String {
        String::new()
    }

    /// 页面需要的脚本块
    fn scripts(&self) -> String {
        String::new()
    }

    /// 把静态资源复制到输出目录的 assets 下；可重复调用
    fn install_assets(&self, _assets_dir: &Path) -> Result<()> {
        Ok(())
    }

    /// 写出 import 声明
    fn write_import(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "import {} {}", self.module(), self.version())
    }
}

/// 主题编辑插件：为模板提供 `theme` 变量
pub trait ThemeEditorPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn theme_vars(&self, source_path: &Path) -> Result<Map<String, Value>>;
}

/// 插件注册表
#[derive(Clone, Default)]
pub struct PluginRegistry {
    /// 按名称保存的元素插件
    element_plugins: BTreeMap<String, Arc<dyn ElementPlugin>>,
    /// 标签名 -> 插件名
    tags: HashMap<String, String>,
    theme_editors: BTreeMap<String, Arc<dyn ThemeEditorPlugin>>,
    active_theme_editor: Option<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带有内置插件的注册表
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.insert_element(Arc::new(MarkdownElement::new()));
        registry.insert_element(Arc::new(MathElement::new()));

        let editor = SettingsThemeEditor::new();
        registry.active_theme_editor = Some(editor.name().to_string());
        registry
            .theme_editors
            .insert(editor.name().to_string(), Arc::new(editor));
        registry
    }

    /// 注册元素插件；名称或标签重复时报错
    pub fn register_element<P: ElementPlugin + 'static>(&mut self, plugin: P) -> Result<()> {
        let name = plugin.name().to_string();
        let tag = plugin.tag_name().to_string();
        if self.element_plugins.contains_key(&name) {
            return Err(anyhow!(PluginError::RegistrationError {
                message: format!("插件 {} 已注册", name),
            }));
        }
        if let Some(owner) = self.tags.get(&tag) {
            return Err(anyhow!(PluginError::RegistrationError {
                message: format!("标签 {} 已由插件 {} 提供", tag, owner),
            }));
        }
        info!("注册元素插件 {} v{} (标签: {})", name, plugin.version(), tag);
        self.insert_element(Arc::new(plugin));
        Ok(())
    }

    fn insert_element(&mut self, plugin: Arc<dyn ElementPlugin>) {
        self.tags
            .insert(plugin.tag_name().to_string(), plugin.name().to_string());
        self.element_plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn register_theme_editor<P: ThemeEditorPlugin + 'static>(&mut self, plugin: P) {
        let name = plugin.name().to_string();
        debug!("注册主题编辑插件 {}", name);
        self.theme_editors.insert(name, Arc::new(plugin));
    }

    /// 根据标签查找插件，找不到时返回 None
    pub fn resolve(&self, tag: &str) -> Option<&dyn ElementPlugin> {
        self.tags
            .get(tag)
            .and_then(|name| self.element_plugins.get(name))
            .map(|plugin| plugin.as_ref())
    }

    pub fn element_plugin_names(&self) -> Vec<&str> {
        self.element_plugins.keys().map(String::as_str).collect()
    }

    pub fn set_active_theme_editor(&mut self, name: &str) -> Result<()> {
        if !self.theme_editors.contains_key(name) {
            return Err(anyhow!(PluginError::NotFound {
                name: name.to_string(),
            }));
        }
        self.active_theme_editor = Some(name.to_string());
        Ok(())
    }

    pub fn clear_active_theme_editor(&mut self) {
        self.active_theme_editor = None;
    }

    /// 当前启用的主题编辑插件
    pub fn active_theme_editor(&self) -> Option<&dyn ThemeEditorPlugin> {
        self.active_theme_editor
            .as_ref()
            .and_then(|name| self.theme_editors.get(name))
            .map(|plugin| plugin.as_ref())
    }
}
