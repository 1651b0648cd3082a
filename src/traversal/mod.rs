//! Table traversal
//!
//! Walks a parsed table through PARAM, FIELD and row stages, validating each
//! element against a constraint catalog and invoking pipeline callbacks.
//!
//! Errors either accumulate in discovery order or abort the traversal at the
//! first one, depending on the fail-fast switch fixed at construction.

mod diagnostics;
mod engine;
mod errors;

pub use diagnostics::Diagnostics;
pub use engine::{
    BoundField, ConvertedCell, ConvertedRow, Stages, Traversal, TraversalReport, TraversalState,
};
pub use errors::{ordinal, Location, TraversalError, TraversalResult, ValidationError};
