//! Constraint catalog
//!
//! - `Constraint`: match rule plus attribute limits for one PARAM or FIELD
//! - `ConstraintCatalog`: immutable, JSON-loaded set of constraints
//! - `ConfigError`: fatal configuration failures
//!
//! Catalogs are loaded once per pipeline variant and shared read-only.

mod catalog;
mod errors;
mod types;

pub use catalog::ConstraintCatalog;
pub use errors::{ConfigError, ConfigErrorCode, ConfigResult};
pub use types::{Constraint, FieldConstraint, ParamConstraint};
