//! Template emission.
//!
//! Backend config selects a template set; placeholders are validated before
//! rendering; modules render in deterministic dependency order from `top`.

pub mod backend;
pub mod emitter;
pub mod template;

pub use backend::{load_backend_config, BackendConfig, DEFAULT_BACKEND_CONFIG};
pub use emitter::{emit_netlist, EmitOptions, EmitResult};
