//! Ingest error type

use thiserror::Error;

use crate::constraint::ConfigError;
use crate::repository::RepositoryError;
use crate::traversal::TraversalError;

/// Hard failures of an ingest run
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file breaks its constraints; messages in discovery order
    #[error("{}", .0.join("\n"))]
    MalformedInput(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("{0}")]
    Configuration(#[from] ConfigError),
}

impl IngestError {
    pub fn malformed(message: impl Into<String>) -> Self {
        IngestError::MalformedInput(vec![message.into()])
    }

    /// Validation messages, if the input was rejected
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            IngestError::MalformedInput(messages) => Some(messages),
            _ => None,
        }
    }
}

impl From<TraversalError> for IngestError {
    fn from(err: TraversalError) -> Self {
        match err {
            TraversalError::Rejected(errors) => {
                IngestError::MalformedInput(errors.iter().map(ToString::to_string).collect())
            }
            TraversalError::Configuration(e) => IngestError::Configuration(e),
            TraversalError::Persistence(e) => IngestError::Database(e),
        }
    }
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::ValidationError;

    #[test]
    fn test_rejection_keeps_positions() {
        let err: IngestError = TraversalError::Rejected(vec![
            ValidationError::param("Catalogue Name", "value cannot be blank"),
            ValidationError::row(0, "Missing TD"),
        ])
        .into();
        assert_eq!(
            err.messages().unwrap(),
            &[
                "Error in PARAM 'Catalogue Name' : value cannot be blank".to_string(),
                "Error in 1st TR : Missing TD".to_string(),
            ]
        );
    }

    #[test]
    fn test_persistence_maps_to_database() {
        let err: IngestError =
            TraversalError::Persistence(RepositoryError::Statement("boom".into())).into();
        assert!(matches!(err, IngestError::Database(_)));
        assert_eq!(err.to_string(), "Database error: Statement failed: boom");
    }
}
