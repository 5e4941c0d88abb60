// src/codec/mod.rs

//! Structured-text codec for manifests and markdown frontmatter
//!
//! The codec understands a pinned subset of YAML: enough for package
//! manifests and agent/command frontmatter, and nothing that needs anchors,
//! tags or complex keys. Parsing keeps mapping order and numeric literal
//! text so values survive a trip through JSON columns unchanged.

mod frontmatter;
mod parser;
mod render;
mod value;

pub use frontmatter::{extract_block, parse_frontmatter};
pub use parser::parse as parse_document;
pub(crate) use parser::resolve_plain;
pub use render::{
    render_document, render_entry, render_flow_list, render_folded, render_inline,
    render_scalar, WRAP_WIDTH,
};
pub use value::{Mapping, Value};
