pub mod context;
pub mod error;
pub mod generator;
pub mod parser;
pub mod serializer;
pub mod server;
pub mod tags;

pub use context::{MenuEntry, SiteContext};
pub use error::{ContentRenderError, GenerateError};
pub use generator::{GenerationReport, Generator, RenderedContent};
pub use parser::{parse_content, parse_document, Document, Import, ParseError};
pub use serializer::SerializeError;
pub use server::Server;
