use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use serde_json::{Map, Value};
use tera::{Context, Tera};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{GeneratorConfig, SiteModel};

/// 默认布局名
pub const DEFAULT_LAYOUT: &str = "default";

/// 一次渲染中最多补上的未定义变量个数
const MAX_UNDEFINED: usize = 256;

/// 模板引擎接口：布局渲染与元素 HTML 的二次渲染。
/// 未定义的变量渲染为空字符串。
pub trait TemplateRenderer: Send + Sync {
    /// 按名称渲染布局，`layout` 不含扩展名
    fn render_layout(&self, layout: &str, context: &Value) -> Result<String>;

    /// 把一段 HTML 当作模板渲染
    fn render_content(&self, body: &str, context: &Value) -> Result<String>;

    fn has_layout(&self, layout: &str) -> bool;
}

/// 基于 Tera 的主题渲染器
#[derive(Clone)]
pub struct ThemeRenderer {
    /// 模板搜索目录，优先级从高到低
    pub search_dirs: Vec<PathBuf>,
    /// 模板引擎
    pub tera: Tera,
    /// 加载失败的模板及原因；只影响用到它们的内容
    pub broken: BTreeMap<String, String>,
}

impl ThemeRenderer {
    /// 按站点和主题目录创建渲染器
    pub fn new(site: &SiteModel, config: &GeneratorConfig) -> Result<Self> {
        Self::with_dirs(Self::search_dirs(site, config))
    }

    /// 搜索顺序：站点 includes、站点 layouts、主题 layouts、主题 includes
    pub fn search_dirs(site: &SiteModel, config: &GeneratorConfig) -> Vec<PathBuf> {
        let theme_dir = config.theme_dir(&site.theme);
        vec![
            site.source_path.join("includes"),
            site.source_path.join("layouts"),
            theme_dir.join("layouts"),
            theme_dir.join("includes"),
        ]
    }

    /// 从给定目录加载模板；同名模板以靠前目录中的为准
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Result<Self> {
        let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

        // 低优先级的先加入，后加入的同名模板覆盖前者
        for dir in search_dirs.iter().rev() {
            if !dir.exists() {
                debug!("模板目录不存在，跳过: {}", dir.display());
                continue;
            }
            for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry.path().strip_prefix(dir)?;
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                sources.insert(name, entry.path().to_path_buf());
            }
        }

        let mut broken = BTreeMap::new();
        let mut templates = Vec::with_capacity(sources.len());
        for (name, path) in sources {
            match fs::read_to_string(&path) {
                Ok(text) => templates.push((name, text)),
                Err(e) => {
                    warn!("读取模板失败 {}: {}", path.display(), e);
                    broken.insert(name, format!("{}: {}", path.display(), e));
                }
            }
        }

        let tera = load_templates(templates, &mut broken);
        info!(
            "Loaded {} templates ({} broken)",
            tera.get_template_names().count(),
            broken.len()
        );

        Ok(Self {
            search_dirs,
            tera,
            broken,
        })
    }

    /// 站点和主题中可用的布局名，站点布局在前
    pub fn available_layouts(site: &SiteModel, config: &GeneratorConfig) -> Vec<String> {
        let dirs = [
            site.source_path.join("layouts"),
            config.theme_dir(&site.theme).join("layouts"),
        ];
        let mut seen = BTreeSet::new();
        let mut layouts = Vec::new();
        for dir in &dirs {
            let mut names = layout_names(dir);
            names.sort();
            for name in names {
                if seen.insert(name.clone()) {
                    layouts.push(name);
                }
            }
        }
        layouts
    }

    /// 布局对应的模板名
    pub fn template_name(layout: &str) -> String {
        let layout = if layout.is_empty() { DEFAULT_LAYOUT } else { layout };
        format!("{}.html", layout)
    }
}

impl TemplateRenderer for ThemeRenderer {
    fn render_layout(&self, layout: &str, context: &Value) -> Result<String> {
        let name = Self::template_name(layout);
        if let Some(cause) = self.broken.get(&name) {
            return Err(anyhow!("布局模板 {} 加载失败: {}", name, cause));
        }
        if !self.has_layout(layout) {
            return Err(anyhow!("布局模板不存在: {}", name));
        }
        render_lenient(context, |ctx| self.tera.render(&name, ctx))
            .with_context(|| format!("渲染布局 {} 失败", name))
    }

    fn render_content(&self, body: &str, context: &Value) -> Result<String> {
        render_lenient(context, |ctx| Tera::one_off(body, ctx, false)).context("渲染内容模板失败")
    }

    fn has_layout(&self, layout: &str) -> bool {
        let name = Self::template_name(layout);
        self.tera.get_template_names().any(|n| n == name)
    }
}

/// 逐步加载模板：出错的模板被剔除并记录，其余照常可用
fn load_templates(mut templates: Vec<(String, String)>, broken: &mut BTreeMap<String, String>) -> Tera {
    loop {
        let mut tera = Tera::default();
        // content 与插件资源都是已经渲染好的 HTML
        tera.autoescape_on(vec![]);
        let err = match tera.add_raw_templates(templates.iter().map(|(n, t)| (n.as_str(), t.as_str()))) {
            Ok(()) => return tera,
            Err(e) => e,
        };

        let culprit = quoted_name(&err.to_string())
            .and_then(|name| templates.iter().position(|(n, _)| *n == name));
        let message = format!("{:#}", anyhow!(err));
        match culprit {
            Some(index) => {
                let (name, _) = templates.remove(index);
                warn!("模板 {} 加载失败: {}", name, message);
                broken.insert(name, message);
            }
            None => {
                warn!("模板加载失败: {}", message);
                for (name, _) in templates.drain(..) {
                    broken.insert(name, message.clone());
                }
            }
        }
    }
}

/// 错误信息中第一个被引号括起的模板名
fn quoted_name(message: &str) -> Option<&str> {
    let start = message.find(['\'', '"', '`'])?;
    let quote = message[start..].chars().next()?;
    let rest = &message[start + 1..];
    rest.find(quote).map(|end| &rest[..end])
}

/// 渲染模板；遇到未定义变量时在上下文中补上空字符串后重试
fn render_lenient<F>(context: &Value, mut render: F) -> Result<String>
where
    F: FnMut(&Context) -> tera::Result<String>,
{
    let mut context = context.clone();
    let mut filled = 0;
    loop {
        let err = match render(&Context::from_serialize(&context)?) {
            Ok(html) => return Ok(html),
            Err(e) => e,
        };
        let Some(path) = missing_variable(&err) else {
            return Err(err.into());
        };
        if filled >= MAX_UNDEFINED || !fill_empty(&mut context, &path) {
            return Err(err.into());
        }
        debug!("未定义的变量 {} 渲染为空", path);
        filled += 1;
    }
}

/// 从 Tera 错误链中找出未定义的变量路径
fn missing_variable(err: &tera::Error) -> Option<String> {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        let message = e.to_string();
        if let Some(start) = message.find("Variable `") {
            let rest = &message[start + "Variable `".len()..];
            if let Some(end) = rest.find("` not found in context") {
                return Some(rest[..end].to_string());
            }
        }
        source = e.source();
    }
    None
}

/// 在 `a.b.c` 路径上放一个空字符串；路径已存在或无法表示时返回 false
fn fill_empty(context: &mut Value, path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty() || s.contains('[')) {
        return false;
    }
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = context;
    for segment in parents {
        let Value::Object(map) = current else {
            return false;
        };
        let next = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if matches!(next, Value::String(s) if s.is_empty()) {
            *next = Value::Object(Map::new());
        }
        current = next;
    }

    match current {
        Value::Object(map) if !map.contains_key(*last) => {
            map.insert(last.to_string(), Value::String(String::new()));
            true
        }
        _ => false,
    }
}

fn layout_names(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        warn!("布局目录不存在: {}", dir.display());
        return Vec::new();
    }
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "html").unwrap_or(false))
        .filter_map(|e| e.path().file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect()
}
