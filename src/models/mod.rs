pub mod config;
pub mod content;
pub mod preset;
pub mod site;

pub use config::GeneratorConfig;
pub use content::{AttrValue, Attributes, Column, Content, ContentType, Item, Row, Section, TEXT_TAG};
pub use preset::ColumnPreset;
pub use site::{Menu, MenuItem, SiteModel};
