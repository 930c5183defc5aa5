//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! Shared state lives behind `Arc`, so clones handed to the code under test
//! report back to the original.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{Batch, SalaryRecord};
use crate::pipeline::{PipelineEvent, PipelineReporter};
use crate::traits::{Fetcher, RecordExtractor, RecordStore};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that ignores the document and returns a fixed batch.
#[derive(Clone)]
pub struct MockExtractor {
    batch: Batch,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    pub fn new(batch: Batch) -> Self {
        Self {
            batch,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl RecordExtractor for MockExtractor {
    fn extract(&self, html: &str) -> Vec<SalaryRecord> {
        self.seen.lock().unwrap().push(html.to_string());
        self.batch.clone()
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Instrumented store: records what it persisted and how many calls overlapped.
#[derive(Clone, Default)]
pub struct MockStore {
    persisted: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    transient_failures: Arc<AtomicUsize>,
    fail_names: Arc<HashSet<String>>,
    panic_names: Arc<HashSet<String>>,
    stall_names: Arc<HashSet<String>>,
    stall: Duration,
    delay: Duration,
}

fn name_set(names: &[&str]) -> Arc<HashSet<String>> {
    Arc::new(names.iter().map(|n| n.to_string()).collect())
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call to `persist` sleeps this long before succeeding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Records with these names fail with a permanent database error.
    pub fn failing_for(mut self, names: &[&str]) -> Self {
        self.fail_names = name_set(names);
        self
    }

    /// Records with these names panic inside `persist`.
    pub fn panicking_for(mut self, names: &[&str]) -> Self {
        self.panic_names = name_set(names);
        self
    }

    /// Records with these names sleep for `stall` before succeeding.
    pub fn stalling_for(mut self, names: &[&str], stall: Duration) -> Self {
        self.stall_names = name_set(names);
        self.stall = stall;
        self
    }

    /// The first `n` calls fail with a retryable network error.
    pub fn with_transient_failures(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn persisted_names(&self) -> Vec<String> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the call is dropped mid-way.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordStore for MockStore {
    async fn persist(&self, record: &SalaryRecord) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.stall_names.contains(record.name()) {
            tokio::time::sleep(self.stall).await;
        }
        if self.panic_names.contains(record.name()) {
            panic!("mock store exploded on {}", record.name());
        }
        if self.fail_names.contains(record.name()) {
            return Err(AppError::DatabaseError(format!(
                "duplicate key value violates unique constraint for {}",
                record.name()
            )));
        }
        let transient = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient {
            return Err(AppError::NetworkError("connection reset by peer".into()));
        }

        self.persisted
            .lock()
            .unwrap()
            .push(record.name().to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock pipeline reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineReporter for MockReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let label = match &event {
            PipelineEvent::Started { .. } => "Started",
            PipelineEvent::RecordPersisted { .. } => "RecordPersisted",
            PipelineEvent::RecordFailed { .. } => "RecordFailed",
            PipelineEvent::Completed { .. } => "Completed",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A record with the given name and a full set of amounts.
pub fn record(name: &str) -> SalaryRecord {
    SalaryRecord::from_cells(
        name,
        &["$1,000", "$2,000", "$3,000", "$4,000", "$5,000"],
    )
}

/// `n` records named `player-0` .. `player-{n-1}`.
pub fn make_batch(n: usize) -> Batch {
    (0..n).map(|i| record(&format!("player-{i}"))).collect()
}
