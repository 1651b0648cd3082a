//! Concrete ingest pipelines
//!
//! - `collection`: collection catalogues, one entries table per file
//! - `metrics`: validation metrics of an evaluation file
//!
//! Both share one constraint catalog per pipeline through an `Arc` and run
//! their work through the execution-mode controller.

pub mod collection;
pub mod metrics;

pub use collection::{CatalogueRecord, CollectionPipeline, CollectionTarget};
pub use metrics::{EvaluationRecord, EvaluationTarget, MetricDefinition, MetricValue, MetricsPipeline};

use crate::ingest::{IngestError, IngestResult, Outcome};
use crate::observability::{log_event_at, log_event_with_fields, Event, ObservationScope, Severity};

/// Logs how a run ended and closes its scope.
///
/// `summary` names the one figure reported for a persisted result.
fn settle<T>(
    scope: ObservationScope,
    run_id: &str,
    result: &IngestResult<Outcome<T>>,
    summary: impl FnOnce(&T) -> (&'static str, String),
) {
    match result {
        Ok(Outcome::Persisted(value)) => {
            let (key, figure) = summary(value);
            log_event_with_fields(
                Event::IngestComplete,
                &[(key, figure.as_str()), ("run_id", run_id)],
            );
            scope.complete_with_fields(&[(key, figure.as_str())]);
        }
        Ok(Outcome::ValidationReport(messages)) => {
            let errors = messages.len().to_string();
            log_event_with_fields(
                Event::ValidationReported,
                &[("errors", errors.as_str()), ("run_id", run_id)],
            );
            scope.complete_with_fields(&[("errors", errors.as_str())]);
        }
        Err(IngestError::MalformedInput(messages)) => {
            let errors = messages.len().to_string();
            log_event_at(
                Severity::Warn,
                Event::IngestRejected,
                &[("errors", errors.as_str()), ("run_id", run_id)],
            );
            scope.reject("malformed input");
        }
        Err(err) => scope.fail(&err.to_string()),
    }
}
