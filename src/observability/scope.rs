//! ObservationScope for begin/complete logging around an operation
//!
//! - `{name}_BEGIN` on creation
//! - `{name}_COMPLETE` or `{name}_FAILED` when closed
//! - `{name}_INCOMPLETE` if dropped while open

use std::time::Instant;

use super::logger::Logger;

/// Logs the lifecycle of one operation.
///
/// Fields given at creation are repeated on every event; closing events also
/// carry `elapsed_ms`.
///
/// ```ignore
/// let scope = ObservationScope::with_fields("INGEST", &[("table", "sources")]);
/// // ... ingest ...
/// scope.complete_with_fields(&[("rows", "42")]);
/// ```
pub struct ObservationScope {
    name: String,
    fields: Vec<(String, String)>,
    timer: Timer,
    open: bool,
}

impl ObservationScope {
    pub fn new(name: &str) -> Self {
        Self::with_fields(name, &[])
    }

    pub fn with_fields(name: &str, fields: &[(&str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timer: Timer::new(),
            open: true,
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.open = false;
        let elapsed = self.timer.elapsed_ms();
        let fields = self.collect_fields(extra, &elapsed);
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Logs `{name}_FAILED` at WARN; the operation was refused, not broken
    pub fn reject(mut self, reason: &str) {
        self.open = false;
        let elapsed = self.timer.elapsed_ms();
        let fields = self.collect_fields(&[("reason", reason)], &elapsed);
        Logger::warn(&format!("{}_FAILED", self.name), &fields);
    }

    /// Logs `{name}_FAILED` at ERROR
    pub fn fail(mut self, reason: &str) {
        self.open = false;
        let elapsed = self.timer.elapsed_ms();
        let fields = self.collect_fields(&[("reason", reason)], &elapsed);
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn collect_fields<'a>(
        &'a self,
        extra: &[(&'a str, &'a str)],
        elapsed: &'a str,
    ) -> Vec<(&'a str, &'a str)> {
        let mut fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend(extra.iter().copied());
        fields.push(("elapsed_ms", elapsed));
        fields
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if self.open {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Elapsed wall-clock time since creation
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
