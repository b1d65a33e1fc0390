use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use tracing::debug;

use super::{PluginError, ThemeEditorPlugin};

/// 主题变量文件名
pub const THEME_SETTINGS_FILE: &str = "theme_settings.yml";

/// 从站点源目录的 `theme_settings.yml` 读取主题变量
#[derive(Debug, Default)]
pub struct SettingsThemeEditor;

impl SettingsThemeEditor {
    pub const NAME: &'static str = "settings";

    pub fn new() -> Self {
        Self
    }

    fn error(message: String) -> anyhow::Error {
        anyhow!(PluginError::ThemeVarsError {
            plugin_name: Self::NAME.to_string(),
            message,
        })
    }
}

impl ThemeEditorPlugin for SettingsThemeEditor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn theme_vars(&self, source_path: &Path) -> Result<Map<String, Value>> {
        let path = source_path.join(THEME_SETTINGS_FILE);
        if !path.exists() {
            debug!("没有主题变量文件: {}", path.display());
            return Ok(Map::new());
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| Self::error(format!("{}: {}", path.display(), e)))?;
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|e| Self::error(e.to_string()))?;
        match serde_json::to_value(yaml).map_err(|e| Self::error(e.to_string()))? {
            Value::Object(vars) => Ok(vars),
            Value::Null => Ok(Map::new()),
            other => Err(Self::error(format!("主题变量必须是映射, 实际为 {}", other))),
        }
    }
}
