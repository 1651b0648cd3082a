//! Transactional ingest boundary
//!
//! Every pipeline runs its work through `run`, which opens one transaction
//! and either commits it (`Normal`) or always discards it (`ValidateOnly`).

mod controller;
mod errors;
mod mode;

pub use controller::run;
pub use errors::{IngestError, IngestResult};
pub use mode::{ExecutionMode, Outcome};
