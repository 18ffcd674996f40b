//! AtomizedGraph.
//!
//! Every net, instance and endpoint becomes a literal scalar with per-atom
//! pattern provenance; endpoint lists are bound to their net's atomized
//! positions by the pattern engine.

pub mod atomizer;
pub mod ir;

pub use atomizer::{atomize_program, AtomizeResult};
pub use ir::*;
