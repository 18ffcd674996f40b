//! PatternedGraph.
//!
//! The hierarchical IR with patterns still unexpanded: modules, devices,
//! net/instance/endpoint bundles with stable ids, and the registries shared
//! by every later stage.

pub mod ir;
pub mod lower;
pub mod registry;

pub use ir::*;
pub use lower::{lower_program, LowerResult};
pub use registry::{
    AnnotationIndex, BackendTemplateRegistry, ExprId, ExprInfo, ExprKind,
    PatternExpressionRegistry, Registries, TemplateEntry,
};
