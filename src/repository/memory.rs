//! In-memory repository
//!
//! Records statements instead of running them. Statements executed inside a
//! transaction stay pending until commit; rollback discards them. Tables
//! named by committed `CREATE TABLE` statements become visible to
//! `table_exists`.

use std::collections::BTreeSet;

use super::{Repository, RepositoryError, RepositoryResult};

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    /// Fully qualified names, `schema.table`
    tables: BTreeSet<String>,
    pending: Vec<String>,
    committed: Vec<String>,
    in_transaction: bool,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    /// Statements containing this text fail, for exercising error paths
    fail_on: Option<String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates an existing table
    pub fn with_table(mut self, schema: &str, table: &str) -> Self {
        self.tables.insert(qualified(schema, table));
        self
    }

    /// Makes every statement containing `fragment` fail
    pub fn failing_on(mut self, fragment: impl Into<String>) -> Self {
        self.fail_on = Some(fragment.into());
        self
    }

    /// Statements that survived a commit, in execution order
    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    /// Statements executed in the open transaction
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn begin_count(&self) -> usize {
        self.begins
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn require_transaction(&self) -> RepositoryResult<()> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(RepositoryError::Transaction("no transaction is open".into()))
        }
    }
}

impl Repository for InMemoryRepository {
    fn table_exists(&self, schema: &str, table: &str) -> RepositoryResult<bool> {
        Ok(self.tables.contains(&qualified(schema, table)))
    }

    fn execute(&mut self, statement: &str) -> RepositoryResult<()> {
        self.require_transaction()?;
        if let Some(fragment) = &self.fail_on {
            if statement.contains(fragment.as_str()) {
                return Err(RepositoryError::Statement(format!(
                    "rejected statement containing '{}'",
                    fragment
                )));
            }
        }
        self.pending.push(statement.to_string());
        Ok(())
    }

    fn begin(&mut self) -> RepositoryResult<()> {
        if self.in_transaction {
            return Err(RepositoryError::Transaction("transaction already open".into()));
        }
        self.in_transaction = true;
        self.begins += 1;
        Ok(())
    }

    fn commit(&mut self) -> RepositoryResult<()> {
        self.require_transaction()?;
        for statement in self.pending.drain(..) {
            for table in created_tables(&statement) {
                self.tables.insert(table);
            }
            self.committed.push(statement);
        }
        self.in_transaction = false;
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> RepositoryResult<()> {
        self.require_transaction()?;
        self.pending.clear();
        self.in_transaction = false;
        self.rollbacks += 1;
        Ok(())
    }
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

fn created_tables(statement: &str) -> Vec<String> {
    statement
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("CREATE TABLE "))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(|name| name.trim_end_matches('(').to_string())
        .collect()
}
