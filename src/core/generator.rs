use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::core::context::SiteContext;
use crate::core::error::{ContentRenderError, GenerateError};
use crate::core::tags;
use crate::models::{Content, GeneratorConfig, SiteModel};
use crate::plugins::PluginRegistry;
use crate::theme::{TemplateRenderer, ThemeRenderer};
use crate::utils;

/// 成功写出的内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedContent {
    pub source: String,
    pub output: PathBuf,
    /// 该内容使用的插件样式
    pub styles: String,
    /// 该内容使用的插件脚本
    pub scripts: String,
}

/// 一次生成的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub site_dir: PathBuf,
    pub rendered: Vec<RenderedContent>,
    pub failures: Vec<ContentRenderError>,
    /// 没有插件提供的标签
    pub unresolved_tags: Vec<String>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, content: &Content, cause: impl std::fmt::Display) {
        let failure = ContentRenderError::new(content.source.clone(), cause);
        error!("{}", failure);
        self.failures.push(failure);
    }

    fn unresolved(&mut self, tag: &str) {
        if !self.unresolved_tags.iter().any(|t| t == tag) {
            warn!("没有插件提供标签 {}", tag);
            self.unresolved_tags.push(tag.to_string());
        }
    }
}

/// 静态站点生成器
pub struct Generator {
    config: GeneratorConfig,
    registry: Arc<PluginRegistry>,
    /// 输出目录 -> 锁，同一站点的生成不能交错
    site_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Generator {
    pub fn new(config: GeneratorConfig, registry: Arc<PluginRegistry>) -> Self {
        Self {
            config,
            registry,
            site_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// 站点的输出目录；标题不能用作目录名时返回错误
    pub fn site_dir(&self, site: &SiteModel) -> Result<PathBuf> {
        self.config
            .site_output_dir(&site.title)
            .map_err(|e| fatal(&self.config.sites_path(), e))
    }

    fn site_lock(&self, site_dir: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.site_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(site_dir.to_path_buf()).or_default().clone()
    }

    /// 生成站点。`content_to_build` 为 None 时清空输出目录并生成全部页面和文章，
    /// 否则只生成该内容（输出目录第一次创建时仍会生成全部内容）。
    pub fn generate_site(
        &self,
        site: &SiteModel,
        content_to_build: Option<&Content>,
    ) -> Result<GenerationReport> {
        let site_dir = self.site_dir(site)?;
        let lock = self.site_lock(&site_dir);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        info!("开始生成站点 '{}' -> {}", site.title, site_dir.display());

        // 模板加载失败只影响用到它的内容，这里不会中止生成
        let renderer = ThemeRenderer::new(site, &self.config)?;

        if content_to_build.is_none() && site_dir.exists() {
            info!("Clearing output directory {}", site_dir.display());
            utils::clear_dir(&site_dir).map_err(|e| fatal(&site_dir, e))?;
        }

        let context = SiteContext::build(site, &self.registry);

        let first_build = !site_dir.exists();
        if first_build {
            fs::create_dir_all(&site_dir).map_err(|e| fatal(&site_dir, e))?;
        }

        let mut report = GenerationReport {
            site_dir: site_dir.clone(),
            ..Default::default()
        };

        match content_to_build {
            Some(content) if !first_build => {
                self.generate_content(site, content, &context, &renderer, &mut report);
            }
            _ => {
                self.stage_assets(site, &site_dir)?;
                let mut target_done = false;
                for content in site.pages.iter().chain(site.posts.iter()) {
                    // 正在编辑的内容优先于站点里保存的版本
                    let content = match content_to_build {
                        Some(target) if target.source == content.source => {
                            target_done = true;
                            target
                        }
                        _ => content,
                    };
                    self.generate_content(site, content, &context, &renderer, &mut report);
                }
                if let Some(target) = content_to_build.filter(|_| !target_done) {
                    self.generate_content(site, target, &context, &renderer, &mut report);
                }
            }
        }

        info!(
            "Generated {} files for site '{}' ({} failed)",
            report.rendered.len(),
            site.title,
            report.failures.len()
        );
        Ok(report)
    }

    /// 复制主题资源、站点资源和站点静态内容
    fn stage_assets(&self, site: &SiteModel, site_dir: &Path) -> Result<()> {
        let assets_dir = site_dir.join("assets");
        let sources = [
            (self.config.theme_dir(&site.theme).join("assets"), assets_dir.clone()),
            (site.source_path.join("assets"), assets_dir),
            (site.source_path.join("content"), site_dir.to_path_buf()),
        ];
        for (src, dst) in &sources {
            if !src.exists() {
                warn!("Asset directory not found: {}", src.display());
                continue;
            }
            let copied = utils::copy_tree(src, dst).map_err(|e| fatal(dst, e))?;
            debug!("Staged {} files from {}", copied, src.display());
        }
        Ok(())
    }

    /// 渲染并写出单个内容；失败只记录到报告中
    fn generate_content(
        &self,
        site: &SiteModel,
        content: &Content,
        context: &SiteContext,
        renderer: &dyn TemplateRenderer,
        report: &mut GenerationReport,
    ) {
        debug!("Generating {}", content.source);
        let site_dir = &report.site_dir;

        for row in content.sections.iter().flat_map(|s| s.rows.iter()) {
            if !row.is_balanced() {
                warn!(
                    "{}: 行的列宽合计为 {}，超过 12",
                    content.source,
                    row.span_total()
                );
            }
        }

        let mut body = String::new();
        let mut unresolved = Vec::new();
        for item in content.items() {
            match item.tag_name() {
                None => body.push_str(item.attribute("text").unwrap_or_default()),
                Some(tag) => match self.registry.resolve(tag) {
                    Some(plugin) => body.push_str(&plugin.to_html(item)),
                    None => unresolved.push(tag.to_string()),
                },
            }
        }

        let mut styles = String::new();
        let mut scripts = String::new();
        let assets_dir = site_dir.join("assets");
        for tag in tags::unique_tags(content) {
            let Some(plugin) = self.registry.resolve(&tag) else {
                continue;
            };
            styles.push_str(&plugin.styles());
            scripts.push_str(&plugin.scripts());
            if let Err(e) = plugin.install_assets(&assets_dir) {
                warn!("安装插件 {} 的资源失败: {:#}", plugin.name(), e);
            }
        }

        let output = site_dir.join(content.url());
        let result = renderer
            .render_content(&body, &context.content_scope(content))
            .and_then(|html| {
                let layout_context = json!({
                    "site": context.site,
                    "theme": context.theme,
                    "plugin": { "styles": styles, "scripts": scripts },
                    "page": context.page_vars(content),
                    "content": html,
                });
                renderer.render_layout(&content.layout, &layout_context)
            })
            .and_then(|page| write_output(&output, &page));

        for tag in &unresolved {
            report.unresolved(tag);
        }
        match result {
            Ok(()) => {
                debug!("Wrote {} for site '{}'", output.display(), site.title);
                report.rendered.push(RenderedContent {
                    source: content.source.clone(),
                    output,
                    styles,
                    scripts,
                });
            }
            Err(e) => report.fail(content, format!("{:#}", e)),
        }
    }
}

fn write_output(output: &Path, html: &str) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, html)
        .map_err(|e| anyhow::anyhow!("无法创建文件 {}: {}", output.display(), e))
}

fn fatal(path: &Path, e: impl std::fmt::Display) -> anyhow::Error {
    GenerateError::FatalIo {
        path: path.to_path_buf(),
        message: format!("{:#}", e),
    }
    .into()
}
