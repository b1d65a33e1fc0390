use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use anyhow::{bail, Context, Result};

/// 生成器配置，构造生成器时显式传入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 安装目录，其下有 `sites/` 与 `themes/`
    pub install_dir: PathBuf,
    /// 每个模板引擎版本对应的 import 声明，例如 `GridPress 2.0`
    pub core_imports: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("."),
            core_imports: vec!["GridPress 2.0".to_string()],
        }
    }
}

impl GeneratorConfig {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            ..Default::default()
        }
    }

    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: GeneratorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 加载配置的别名
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_file(path)
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// 所有站点输出目录的父目录
    pub fn sites_path(&self) -> PathBuf {
        self.install_dir.join("sites")
    }

    pub fn themes_path(&self) -> PathBuf {
        self.install_dir.join("themes")
    }

    pub fn theme_dir(&self, theme: &str) -> PathBuf {
        self.themes_path().join(theme)
    }

    /// 某个站点的输出目录。标题必须是 `sites/` 下的单个目录名
    pub fn site_output_dir(&self, site_title: &str) -> Result<PathBuf> {
        let mut components = Path::new(site_title).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == site_title => {
                Ok(self.sites_path().join(name))
            }
            _ => bail!("站点标题不能用作目录名: {:?}", site_title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_titles_must_be_a_single_directory_name() {
        let config = GeneratorConfig::new("/srv/gridpress");
        assert_eq!(
            config.site_output_dir("My Site").unwrap(),
            PathBuf::from("/srv/gridpress/sites/My Site")
        );
        for title in ["", ".", "..", "a/b", "/etc", "../other", "Site/", "./Site"] {
            assert!(config.site_output_dir(title).is_err(), "{:?}", title);
        }
    }
}
