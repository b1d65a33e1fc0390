pub mod cli;
pub mod core;
pub mod models;
pub mod plugins;
pub mod theme;
pub mod utils;

// Re-export commonly used types and traits
pub use crate::core::{ContentRenderError, GenerationReport, Generator};
pub use crate::models::{Column, Content, ContentType, GeneratorConfig, Item, Row, Section, SiteModel};
pub use crate::plugins::{ElementPlugin, PluginRegistry, ThemeEditorPlugin};
pub use crate::theme::renderer::{TemplateRenderer, ThemeRenderer};
