use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ElementPlugin, PluginError};
use crate::models::Item;

const KATEX_CDN: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist";

/// 自动渲染脚本在 assets 下的位置
pub const RENDER_SCRIPT: &str = "js/math-render.js";

/// KaTeX 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KatexConfig {
    /// 是否启用自动渲染
    pub auto_render: bool,
    /// 是否启用 mhchem 扩展
    pub mhchem: bool,
    /// 是否在错误时抛出
    pub throw_on_error: bool,
    /// 错误颜色
    pub error_color: String,
}

impl Default for KatexConfig {
    fn default() -> Self {
        Self {
            auto_render: true,
            mhchem: false,
            throw_on_error: false,
            error_color: "#cc0000".to_string(),
        }
    }
}

/// 数学公式元素，使用 KaTeX 渲染
#[derive(Debug, Default)]
pub struct MathElement {
    config: KatexConfig,
}

impl MathElement {
    pub const NAME: &'static str = "math";
    pub const TAG: &'static str = "Math";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KatexConfig) -> Self {
        Self { config }
    }

    fn render_script(&self) -> String {
        format!(
            r#"document.addEventListener("DOMContentLoaded", function() {{
    renderMathInElement(document.body, {{
        delimiters: [
            {{left: "\\(", right: "\\)", display: false}},
            {{left: "\\[", right: "\\]", display: true}}
        ],
        throwOnError: {},
        errorColor: "{}"
    }});
}});
"#,
            self.config.throw_on_error, self.config.error_color
        )
    }
}

impl ElementPlugin for MathElement {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn tag_name(&self) -> &str {
        Self::TAG
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn to_html(&self, item: &Item) -> String {
        let formula = item
            .attribute("formula")
            .or_else(|| item.attribute("text"))
            .unwrap_or_default();
        // 花括号转成实体，内容模板渲染时保持原样
        let formula = html_escape::encode_text(formula)
            .replace('{', "&#123;")
            .replace('}', "&#125;");
        let inline = item.attributes.get("inline").map(|v| v.is_set()).unwrap_or(false);
        if inline {
            format!(r#"<span class="math inline">\({}\)</span>"#, formula)
        } else {
            format!(r#"<div class="math display">\[{}\]</div>"#, formula)
        }
    }

    fn styles(&self) -> String {
        format!("<link rel=\"stylesheet\" href=\"{}/katex.min.css\">\n", KATEX_CDN)
    }

    fn scripts(&self) -> String {
        let mut scripts = format!("<script defer src=\"{}/katex.min.js\"></script>\n", KATEX_CDN);
        if self.config.mhchem {
            scripts.push_str(&format!(
                "<script defer src=\"{}/contrib/mhchem.min.js\"></script>\n",
                KATEX_CDN
            ));
        }
        if self.config.auto_render {
            scripts.push_str(&format!(
                "<script defer src=\"{}/contrib/auto-render.min.js\"></script>\n",
                KATEX_CDN
            ));
            scripts.push_str(&format!("<script defer src=\"/assets/{}\"></script>\n", RENDER_SCRIPT));
        }
        scripts
    }

    fn install_assets(&self, assets_dir: &Path) -> Result<()> {
        if !self.config.auto_render {
            return Ok(());
        }
        let target = assets_dir.join(RENDER_SCRIPT);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, self.render_script())
        };
        write().map_err(|e| {
            anyhow!(PluginError::AssetError {
                plugin_name: Self::NAME.to_string(),
                message: format!("{}: {}", target.display(), e),
            })
        })?;
        debug!("安装数学公式渲染脚本: {}", target.display());
        Ok(())
    }
}
