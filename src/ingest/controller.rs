//! Execution-mode controller
//!
//! Wraps one unit of ingest work in a single transaction:
//!
//! | mode         | work succeeds           | work rejects input           | other failure |
//! |--------------|-------------------------|------------------------------|---------------|
//! | Normal       | commit, `Persisted`     | rollback, `MalformedInput`   | rollback, Err |
//! | ValidateOnly | rollback, empty report  | rollback, report of messages | rollback, Err |

use super::errors::{IngestError, IngestResult};
use super::mode::{ExecutionMode, Outcome};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::repository::{Repository, RepositoryResult};

/// Runs `work` inside a transaction and settles it according to `mode`.
///
/// `work` should traverse in fail-fast mode exactly when
/// `mode.fail_fast()` is true.
pub fn run<R, T, F>(mode: ExecutionMode, repository: &mut R, work: F) -> IngestResult<Outcome<T>>
where
    R: Repository + ?Sized,
    F: FnOnce(&mut R) -> IngestResult<T>,
{
    repository.begin()?;
    let result = work(repository);

    match mode {
        ExecutionMode::Normal => match result {
            Ok(value) => {
                if let Err(err) = repository.commit() {
                    rollback_after_failure(repository, mode);
                    return Err(err.into());
                }
                log_event_with_fields(Event::TransactionCommitted, &[("mode", mode.as_str())]);
                Ok(Outcome::Persisted(value))
            }
            Err(err) => {
                rollback_after_failure(repository, mode);
                Err(err)
            }
        },
        ExecutionMode::ValidateOnly => match result {
            Ok(_) => {
                rollback(repository, mode)?;
                Ok(Outcome::ValidationReport(Vec::new()))
            }
            Err(IngestError::MalformedInput(messages)) => {
                rollback(repository, mode)?;
                Ok(Outcome::ValidationReport(messages))
            }
            Err(err) => {
                rollback_after_failure(repository, mode);
                Err(err)
            }
        },
    }
}

fn rollback<R: Repository + ?Sized>(repository: &mut R, mode: ExecutionMode) -> RepositoryResult<()> {
    repository.rollback()?;
    log_event_with_fields(Event::TransactionRolledBack, &[("mode", mode.as_str())]);
    Ok(())
}

/// Rolls back while another error is already on its way out
fn rollback_after_failure<R: Repository + ?Sized>(repository: &mut R, mode: ExecutionMode) {
    if let Err(err) = rollback(repository, mode) {
        Logger::error(
            Event::RollbackFailed.as_str(),
            &[("mode", mode.as_str()), ("reason", err.to_string().as_str())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, RepositoryError};

    fn insert(repo: &mut InMemoryRepository) -> IngestResult<u32> {
        repo.execute("INSERT INTO casda.t (a) VALUES (1);")?;
        Ok(1)
    }

    #[test]
    fn test_normal_success_commits() {
        let mut repo = InMemoryRepository::new();
        let outcome = run(ExecutionMode::Normal, &mut repo, insert).unwrap();

        assert_eq!(outcome, Outcome::Persisted(1));
        assert_eq!(repo.commit_count(), 1);
        assert_eq!(repo.rollback_count(), 0);
        assert_eq!(repo.committed().len(), 1);
    }

    #[test]
    fn test_normal_rejection_rolls_back() {
        let mut repo = InMemoryRepository::new();
        let err = run(ExecutionMode::Normal, &mut repo, |repo| {
            insert(repo)?;
            Err::<u32, _>(IngestError::malformed("Error in TABLE : bad"))
        })
        .unwrap_err();

        assert_eq!(err.messages().unwrap(), &["Error in TABLE : bad".to_string()]);
        assert_eq!(repo.commit_count(), 0);
        assert_eq!(repo.rollback_count(), 1);
        assert!(repo.committed().is_empty());
    }

    #[test]
    fn test_validate_only_never_commits() {
        let mut repo = InMemoryRepository::new();
        let outcome = run(ExecutionMode::ValidateOnly, &mut repo, insert).unwrap();

        assert_eq!(outcome, Outcome::ValidationReport(Vec::new()));
        assert_eq!(repo.commit_count(), 0);
        assert_eq!(repo.rollback_count(), 1);
        assert!(repo.committed().is_empty());
        assert!(!repo.in_transaction());
    }

    #[test]
    fn test_validate_only_reports_messages() {
        let mut repo = InMemoryRepository::new();
        let outcome = run(ExecutionMode::ValidateOnly, &mut repo, |_| {
            Err::<(), _>(IngestError::MalformedInput(vec!["a".into(), "b".into()]))
        })
        .unwrap();

        assert_eq!(outcome.report().unwrap(), &["a".to_string(), "b".to_string()]);
        assert_eq!(repo.rollback_count(), 1);
    }

    #[test]
    fn test_database_error_is_distinct_in_both_modes() {
        for mode in [ExecutionMode::Normal, ExecutionMode::ValidateOnly] {
            let mut repo = InMemoryRepository::new().failing_on("INSERT");
            let err = run(mode, &mut repo, insert).unwrap_err();
            assert!(matches!(err, IngestError::Database(RepositoryError::Statement(_))));
            assert_eq!(repo.commit_count(), 0);
            assert_eq!(repo.rollback_count(), 1);
        }
    }
}
