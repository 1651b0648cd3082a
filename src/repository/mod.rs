//! Persistence boundary
//!
//! The engine never talks to a database directly. It issues existence checks
//! and rendered statements through the `Repository` trait, inside one
//! transaction opened and closed by the execution-mode controller.

mod memory;

pub use memory::InMemoryRepository;

use thiserror::Error;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures reported by the storage layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Statement failed: {0}")]
    Statement(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Synchronous access to the target database
pub trait Repository {
    /// Returns true if `schema.table` already exists
    fn table_exists(&self, schema: &str, table: &str) -> RepositoryResult<bool>;

    /// Executes one rendered statement inside the open transaction
    fn execute(&mut self, statement: &str) -> RepositoryResult<()>;

    fn begin(&mut self) -> RepositoryResult<()>;

    fn commit(&mut self) -> RepositoryResult<()>;

    fn rollback(&mut self) -> RepositoryResult<()>;
}
