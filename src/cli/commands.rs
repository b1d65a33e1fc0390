use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::core::{tags, GenerationReport, Generator, Server};
use crate::models::{
    ColumnPreset, Content, ContentType, GeneratorConfig, Item, Row, Section, SiteModel,
};
use crate::plugins::PluginRegistry;
use crate::theme::{self, ThemeRenderer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 站点源目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// 生成器配置文件 (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 安装目录，其下有 sites/ 与 themes/
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 初始化新站点
    Init(InitArgs),

    /// 创建新的页面或文章
    New(NewArgs),

    /// 生成静态文件
    Build(BuildArgs),

    /// 列出可用布局
    Layouts,

    /// 列出已安装的主题
    Themes,

    /// 修改站点标题并重命名输出目录
    Rename(RenameArgs),

    /// 显示内容使用的元素标签
    Tags(TagsArgs),

    /// 启动本地预览服务器
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// 站点标题
    pub title: String,
}

#[derive(Args)]
pub struct NewArgs {
    /// 标题
    pub title: String,

    /// 创建文章而不是页面
    #[arg(long)]
    pub post: bool,

    /// 使用的布局
    #[arg(short, long)]
    pub layout: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// 只生成指定源文件的内容
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args)]
pub struct RenameArgs {
    /// 新标题
    pub title: String,
}

#[derive(Args)]
pub struct TagsArgs {
    /// 内容源文件名，例如 index.xml
    pub source: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// 端口
    #[arg(short, long, default_value = "4000")]
    pub port: u16,

    /// 启动前先生成整个站点
    #[arg(short, long)]
    pub build: bool,
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = &cli.install_dir {
        config.install_dir = dir.clone();
    }
    Ok(config)
}

/// 新内容的初始结构：一个区块、一行、一列
fn starter_section(text: &str) -> Section {
    let mut row = Row::new();
    row.insert_columns(ColumnPreset::Full);
    for column in row.columns.iter_mut() {
        column.append_item(Item::text(text));
    }
    let mut section = Section::new(false);
    section.append_row(row);
    section
}

fn print_report(report: &GenerationReport) {
    for rendered in &report.rendered {
        println!("  {} {}", "✓".bright_green(), rendered.output.display());
    }
    for tag in &report.unresolved_tags {
        println!("  {} 没有插件提供标签 {}", "!".bright_yellow(), tag);
    }
    for failure in &report.failures {
        println!("  {} {}", "✗".bright_red(), failure);
    }
    println!(
        "{} {} 个文件已生成到 {}",
        "Done:".bright_cyan(),
        report.rendered.len(),
        report.site_dir.display()
    );
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let registry = Arc::new(PluginRegistry::with_builtin());
    let site_path = cli.path.clone();

    match cli.command {
        Commands::Init(args) => {
            let site = SiteModel::new(args.title, site_path.clone());
            site.save()?;

            let mut index = Content::new(ContentType::Page);
            index.title = "Home".to_string();
            index.source = "index.xml".to_string();
            index.layout = "default".to_string();
            index.date = Some(Local::now().date_naive());
            index.append_section(starter_section("<h1>Welcome</h1>"));
            site.save_content(&index, &registry, &config)?;

            info!("Initialized new site at: {}", site_path.display());
        }
        Commands::New(args) => {
            let site = SiteModel::load(&site_path)?;
            let content_type = if args.post { ContentType::Post } else { ContentType::Page };
            let mut content = Content::new(content_type);
            content.source = Content::source_from_title(&args.title);
            if site.find_content(&content.source).is_some() {
                return Err(anyhow!("内容已存在: {}", content.source));
            }
            content.layout = args.layout.unwrap_or_else(|| match content_type {
                ContentType::Post => "post".to_string(),
                ContentType::Page => "default".to_string(),
            });
            content.author = site.author.clone();
            content.date = Some(Local::now().date_naive());
            content.append_section(starter_section(&format!("<h1>{}</h1>", args.title)));
            content.title = args.title;

            let path = site.save_content(&content, &registry, &config)?;
            println!("{} {}", "Created:".bright_green(), path.display());
        }
        Commands::Build(args) => {
            let site = SiteModel::load(&site_path)?;
            let target = match args.content {
                Some(source) => Some(
                    site.find_content(&source)
                        .cloned()
                        .ok_or_else(|| anyhow!("找不到内容: {}", source))?,
                ),
                None => None,
            };

            let generator = Generator::new(config, registry);
            let report = generator.generate_site(&site, target.as_ref())?;
            print_report(&report);
            if !report.is_success() {
                return Err(anyhow!("{} 个内容生成失败", report.failures.len()));
            }
        }
        Commands::Layouts => {
            let site = SiteModel::load(&site_path)?;
            for layout in ThemeRenderer::available_layouts(&site, &config) {
                println!("  - {}", layout);
            }
        }
        Commands::Themes => {
            let site = SiteModel::load(&site_path)?;
            for theme in theme::list_themes(&config, &site.theme)? {
                let marker = if theme.active { "*".bright_green() } else { " ".normal() };
                let sample = theme
                    .sample_url
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!("{} {} {}", marker, theme.name, sample.dimmed());
            }
        }
        Commands::Rename(args) => {
            let mut site = SiteModel::load(&site_path)?;
            site.rename(&args.title, &config)?;
            println!("{} {}", "Renamed to".bright_green(), site.title);
        }
        Commands::Tags(args) => {
            let site = SiteModel::load(&site_path)?;
            let content = site
                .find_content(&args.source)
                .ok_or_else(|| anyhow!("找不到内容: {}", args.source))?;
            for tag in tags::unique_tags(content) {
                match registry.resolve(&tag) {
                    Some(plugin) => println!("  {} ({} v{})", tag, plugin.name(), plugin.version()),
                    None => println!("  {} {}", tag, "(未安装插件)".bright_red()),
                }
            }
        }
        Commands::Serve(args) => {
            let site = SiteModel::load(&site_path)?;
            let generator = Generator::new(config, registry);
            if args.build {
                let report = generator.generate_site(&site, None)?;
                print_report(&report);
            }
            Server::new(generator.site_dir(&site)?, args.port).start().await?;
        }
    }

    Ok(())
}
