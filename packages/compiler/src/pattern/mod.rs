//! Pattern engine.
//!
//! Purely functional over strings: parse an expression into segments and
//! groups, expand it to an ordered atom list with per-atom provenance, and
//! bind a left-hand atom list to a right-hand endpoint list (elementwise,
//! scalar broadcast, or axis projection).

pub mod bind;
pub mod expand;
pub mod segment;

pub use bind::{bind, BindError};
pub use expand::{
    expand, expand_endpoints, find_duplicates, Atom, EndpointAtom, ExpandOptions, Expansion,
    GroupDim, DEFAULT_EXPANSION_CAP,
};
pub use segment::{parse_expression, Group, PatternError, Piece, Segment};
