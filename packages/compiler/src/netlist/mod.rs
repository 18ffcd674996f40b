//! NetlistIR.
//!
//! The flat, emission-ready IR: top resolution, collision-free emitted
//! names, ordered connections, and per-module pattern expression tables.

pub mod ir;
pub mod lower;

pub use ir::*;
pub use lower::{
    lower_netlist, resolve_top, select_by_symbol, select_module, NetlistLowerResult, TopPolicy,
};
