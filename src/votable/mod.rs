//! Typed value model for VOTABLE tables
//!
//! Provides:
//! - Declared PARAMs, FIELDs, rows and tables
//! - Datatypes and converted values
//! - `arraysize` and `precision` attribute syntax

mod arraysize;
mod datatype;
mod precision;
mod types;

pub use arraysize::{Arraysize, ARRAYSIZE_PATTERN};
pub use datatype::{FieldDatatype, TypedValue};
pub use precision::{Precision, PRECISION_PATTERN};
pub use types::{Declared, DeclaredField, DeclaredParam, ElementKind, FieldKey, Row, Table};

use thiserror::Error;

/// An attribute value that does not follow its VOTABLE syntax
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Attribute '{attribute}' ('{value}') does not match '{pattern}'")]
pub struct SyntaxError {
    attribute: &'static str,
    value: String,
    pattern: &'static str,
}

impl SyntaxError {
    pub fn new(attribute: &'static str, value: impl Into<String>, pattern: &'static str) -> Self {
        Self {
            attribute,
            value: value.into(),
            pattern,
        }
    }

    pub fn attribute(&self) -> &str {
        self.attribute
    }
}
