//! Statement generation
//!
//! Provides:
//! - `SqlIdentifier` and `SqlText`, the only fragments renderers accept
//! - Column descriptors and their storage types
//! - `create_table`, `insert_row` and `register_metadata`

mod column;
mod identifier;
mod render;

pub use column::{ColumnDescriptor, SqlType, SqlValue, UNRESOLVED_CHAR_WIDTH};
pub use identifier::{
    escape_literal, is_safe_identifier, IdentifierError, SqlIdentifier, SqlText, IDENTIFIER_PATTERN,
};
pub use render::{create_table, insert_row, register_metadata, CATALOGUE_FORMAT};
