//! Typed AST.
//!
//! Construction goes marked YAML -> schema validation -> named-pattern
//! elaboration; every later stage consumes the elaborated document.

pub mod named_patterns;
pub mod nodes;
pub mod schema;
pub mod shorthand;

pub use nodes::*;
pub use schema::{document_from_yaml, SchemaResult};
