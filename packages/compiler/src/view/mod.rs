//! View binding.
//!
//! A view config names profiles of ordered rules; applying a profile
//! rewrites instance references (including occurrence-scoped rewrites deep
//! in the hierarchy) after atomization.

pub mod binder;
pub mod config;

pub use binder::{apply_views, BindingRecord, ViewBindResult};
pub use config::{load_view_config, RuleMatch, ViewConfig, ViewProfile, ViewRule};
