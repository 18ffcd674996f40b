//! Marked YAML reader.
//!
//! Reads the YAML subset `.asdl` documents are written in while preserving
//! line/column information on every node, which the stock serde path cannot
//! do. Block and flow mappings/sequences, plain and quoted scalars, literal
//! and folded block scalars, and comments are supported; mappings preserve
//! authoring order.

pub mod ast;
pub mod reader;

pub use ast::{ScalarStyle, YamlKey, YamlNode, YamlValue};
pub use reader::{parse_document, YamlParseResult};
