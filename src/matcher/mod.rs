//! Constraint matcher and value converter
//!
//! Matches declared PARAMs and FIELDs against a constraint catalog, checks
//! their attributes, and converts raw values to typed values.
//!
//! All checks return the bare message of the first violation; the traversal
//! engine attaches the position (`Error in PARAM 'X' : ...`).

mod convert;
mod rules;

pub use convert::{convert, Limit, ValueLimits};
pub use rules::{
    applies_to, check_attributes, check_declared, match_field, match_param, merged_constraint,
    resolve_datatype,
};
