//! Content module - loads, parses and renders writings

mod error;
mod frontmatter;
mod markdown;
mod store;
mod writing;

pub use error::ContentError;
pub use frontmatter::{Author, Metadata, OpenGraph};
pub use markdown::{
    html_escape, is_external, Anchor, CodeBlock, CodePresentation, MarkdownRenderer, Node,
    RenderedDocument, EXTERNAL_REL, EXTERNAL_TARGET,
};
pub use store::{validate_slug, DocumentStore};
pub use writing::Writing;
