//! Import resolution.
//!
//! Builds the file graph rooted at the entry file: path-expression
//! expansion, logical-root lookup through `ASDL_LIB_PATH`, cycle detection,
//! and the per-file name environment.

pub mod name_env;
pub mod path_expand;
pub mod resolver;

pub use name_env::{NameEnv, SymbolKind};
pub use resolver::{load_program, ProgramDB, ResolverConfig};
