use std::fmt;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// Why a single record was not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The store returned an error.
    #[error("{message}")]
    Store { message: String },

    /// The persist call exceeded the per-record timeout.
    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// The run was cancelled before this record finished.
    #[error("cancelled")]
    Cancelled,

    /// The task ended without producing an outcome of its own.
    #[error("aborted: {message}")]
    Aborted { message: String },
}

impl FailureReason {
    pub fn timed_out(after: Duration) -> Self {
        FailureReason::TimedOut {
            after_ms: after.as_millis() as u64,
        }
    }
}

/// A failed record, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    pub name: String,
    pub reason: FailureReason,
}

impl fmt::Display for PersistFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error inserting {}: {}", self.name, self.reason)
    }
}

/// Result of one persist attempt. Exactly one per record in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Success { name: String },
    Failure(PersistFailure),
}

impl PersistOutcome {
    pub fn failure(name: impl Into<String>, reason: FailureReason) -> Self {
        PersistOutcome::Failure(PersistFailure {
            name: name.into(),
            reason,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            PersistOutcome::Success { name } => name,
            PersistOutcome::Failure(failure) => &failure.name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PersistOutcome::Success { .. })
    }
}

/// Aggregate report for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<PersistFailure>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Fold one outcome into the counters. Order of calls does not matter.
    pub fn record(&mut self, outcome: PersistOutcome) {
        self.attempted += 1;
        match outcome {
            PersistOutcome::Success { .. } => self.succeeded += 1,
            PersistOutcome::Failure(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// `succeeded + failed == attempted`.
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.attempted && self.failures.len() == self.failed
    }

    pub fn failure_reasons(&self) -> impl Iterator<Item = &FailureReason> {
        self.failures.iter().map(|f| &f.reason)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total records found: {}", self.attempted)?;
        writeln!(f, "Records successfully inserted: {}", self.succeeded)?;
        write!(f, "Records with errors: {}", self.failed)?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}
