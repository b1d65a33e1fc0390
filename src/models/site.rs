use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{parser, serializer};
use crate::models::config::GeneratorConfig;
use crate::models::content::{Content, ContentType};
use crate::plugins::PluginRegistry;

/// 站点元数据文件名
pub const SITE_FILE: &str = "site.yml";

/// 内容源文件的扩展名
const CONTENT_EXTENSIONS: [&str; 2] = ["xml", "qml"];

/// 菜单项，可以包含同样结构的子菜单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    pub title: String,
    pub url: String,
    pub icon: String,
    pub attributes: BTreeMap<String, String>,
    pub items: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// 拼接成 `name="value"` 形式的属性串
    pub fn attribute_string(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| format!("{}=\"{}\"", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 命名菜单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Menu {
    pub name: String,
    pub items: Vec<MenuItem>,
}

/// 站点模型：元数据、菜单以及所有页面和文章
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteModel {
    pub title: String,
    pub description: String,
    pub theme: String,
    pub copyright: String,
    pub keywords: String,
    pub author: String,
    pub logo: String,
    /// 发布插件的键
    pub publisher: String,
    pub attributes: BTreeMap<String, String>,
    pub menus: Vec<Menu>,
    /// 站点源目录
    #[serde(skip)]
    pub source_path: PathBuf,
    #[serde(skip)]
    pub pages: Vec<Content>,
    #[serde(skip)]
    pub posts: Vec<Content>,
}

impl SiteModel {
    pub fn new(title: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            theme: "default".to_string(),
            source_path: source_path.into(),
            ..Default::default()
        }
    }

    /// 从站点源目录加载 `site.yml` 以及所有页面和文章
    pub fn load(source_path: &Path) -> Result<Self> {
        let site_file = source_path.join(SITE_FILE);
        let yaml = fs::read_to_string(&site_file)
            .with_context(|| format!("读取站点文件失败: {}", site_file.display()))?;
        let mut site: SiteModel = serde_yaml::from_str(&yaml)
            .with_context(|| format!("解析站点文件失败: {}", site_file.display()))?;
        site.source_path = source_path.to_path_buf();
        site.pages = site.load_folder(ContentType::Page)?;
        site.posts = site.load_folder(ContentType::Post)?;
        info!(
            "Loaded site '{}' ({} pages, {} posts)",
            site.title,
            site.pages.len(),
            site.posts.len()
        );
        Ok(site)
    }

    /// 保存 `site.yml`
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.source_path)?;
        let yaml = serde_yaml::to_string(self)?;
        let site_file = self.source_path.join(SITE_FILE);
        fs::write(&site_file, yaml)
            .with_context(|| format!("写入站点文件失败: {}", site_file.display()))?;
        Ok(())
    }

    /// 内容源文件的完整路径
    pub fn content_path(&self, content_type: ContentType, source: &str) -> PathBuf {
        self.source_path.join(content_type.folder()).join(source)
    }

    pub fn load_content(&self, source: &str, content_type: ContentType) -> Result<Content> {
        let path = self.content_path(content_type, source);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("读取内容文件失败: {}", path.display()))?;
        let mut content = parser::parse_content(&text)
            .with_context(|| format!("解析内容文件失败: {}", path.display()))?;
        content.source = source.to_string();
        content.content_type = content_type;
        Ok(content)
    }

    /// 将内容写回其源文件
    pub fn save_content(
        &self,
        content: &Content,
        registry: &PluginRegistry,
        config: &GeneratorConfig,
    ) -> Result<PathBuf> {
        if content.source.is_empty() {
            return Err(anyhow!("内容 '{}' 没有源文件名", content.title));
        }
        let text = serializer::save(content, registry, &config.core_imports)?;
        let path = self.content_path(content.content_type, &content.source);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text).with_context(|| format!("写入内容文件失败: {}", path.display()))?;
        debug!("Saved content {}", path.display());
        Ok(path)
    }

    /// 加入页面或文章集合；同名内容会被替换
    pub fn add_content(&mut self, content: Content) {
        let list = self.list_mut(content.content_type);
        match list.iter_mut().find(|c| c.source == content.source) {
            Some(existing) => *existing = content,
            None => list.push(content),
        }
    }

    pub fn remove_content(&mut self, source: &str, content_type: ContentType) -> Option<Content> {
        let list = self.list_mut(content_type);
        let index = list.iter().position(|c| c.source == source)?;
        Some(list.remove(index))
    }

    pub fn find_content(&self, source: &str) -> Option<&Content> {
        self.pages
            .iter()
            .chain(self.posts.iter())
            .find(|c| c.source == source)
    }

    pub fn menu(&self, name: &str) -> Option<&Menu> {
        self.menus.iter().find(|m| m.name == name)
    }

    /// 修改站点标题，并同步重命名输出目录
    pub fn rename(&mut self, new_title: &str, config: &GeneratorConfig) -> Result<()> {
        if new_title == self.title {
            return Ok(());
        }
        let new_dir = config.site_output_dir(new_title)?;
        let old_dir = config.site_output_dir(&self.title).ok();
        self.title = new_title.to_string();
        self.save()?;

        if let Some(old_dir) = old_dir.filter(|d| d.exists()) {
            fs::rename(&old_dir, &new_dir).with_context(|| {
                format!("重命名输出目录失败: {} -> {}", old_dir.display(), new_dir.display())
            })?;
            info!(
                "Output path has been renamed to {}, site should be rebuilt",
                new_dir.display()
            );
        }
        Ok(())
    }

    fn list_mut(&mut self, content_type: ContentType) -> &mut Vec<Content> {
        match content_type {
            ContentType::Page => &mut self.pages,
            ContentType::Post => &mut self.posts,
        }
    }

    fn load_folder(&self, content_type: ContentType) -> Result<Vec<Content>> {
        let folder = self.source_path.join(content_type.folder());
        if !folder.exists() {
            warn!("Content folder not found: {}", folder.display());
            return Ok(Vec::new());
        }

        let mut sources = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let path = entry?.path();
            let is_content = path
                .extension()
                .map(|ext| CONTENT_EXTENSIONS.iter().any(|e| ext == *e))
                .unwrap_or(false);
            if path.is_file() && is_content {
                if let Some(name) = path.file_name() {
                    sources.push(name.to_string_lossy().to_string());
                }
            }
        }
        sources.sort();

        sources
            .iter()
            .map(|source| self.load_content(source, content_type))
            .collect()
    }
}
