use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::models::GeneratorConfig;

pub mod renderer;

pub use renderer::{TemplateRenderer, ThemeRenderer, DEFAULT_LAYOUT};

/// 已安装的主题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeInfo {
    pub name: String,
    /// 预览图 `sample.png`
    pub sample_pic: Option<PathBuf>,
    /// 示例页面 `sample.html`
    pub sample_url: Option<PathBuf>,
    pub active: bool,
}

/// 列出安装目录下的所有主题，按名称排序
pub fn list_themes(config: &GeneratorConfig, active: &str) -> Result<Vec<ThemeInfo>> {
    let themes_path = config.themes_path();
    if !themes_path.exists() {
        warn!("主题目录不存在: {}", themes_path.display());
        return Ok(Vec::new());
    }

    let mut themes = Vec::new();
    for entry in fs::read_dir(&themes_path)
        .with_context(|| format!("读取主题目录失败: {}", themes_path.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let dir = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let existing = |file: &str| Some(dir.join(file)).filter(|p| p.exists());
        themes.push(ThemeInfo {
            sample_pic: existing("sample.png"),
            sample_url: existing("sample.html"),
            active: name == active,
            name,
        });
    }
    themes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(themes)
}
