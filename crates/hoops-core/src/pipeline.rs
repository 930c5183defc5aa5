//! Bounded, failure-tolerant persistence of a batch of records.
//!
//! Every record gets its own task. A counting semaphore admits at most
//! `concurrency_limit` of them into the store at once, each persist call is
//! bounded by `item_timeout`, and the caller drains the outcomes one by one
//! into a [`RunSummary`]. A failing record never stops its siblings.
//!
//! ```text
//! batch ──spawn──► [task]──acquire permit──► store.persist (timeout) ──┐
//!                  [task]──acquire permit──► store.persist (timeout) ──┼──► JoinSet ──► RunSummary
//!                  [task]──waiting for a permit ...                    ──┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Batch, SalaryRecord};
use crate::summary::{FailureReason, PersistFailure, PersistOutcome, RunSummary};
use crate::traits::RecordStore;

/// Resource limits for one pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of persist calls in flight at any instant.
    pub concurrency_limit: usize,

    /// Wall-clock bound on a single record's persist call.
    pub item_timeout: Duration,
}

impl PipelineConfig {
    pub fn new(concurrency_limit: usize, item_timeout: Duration) -> Self {
        Self {
            concurrency_limit,
            item_timeout,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.concurrency_limit == 0 {
            return Err(AppError::ConfigError(
                "concurrency limit must be at least 1".into(),
            ));
        }
        if self.concurrency_limit > Semaphore::MAX_PERMITS {
            return Err(AppError::ConfigError(format!(
                "concurrency limit {} exceeds the maximum of {}",
                self.concurrency_limit,
                Semaphore::MAX_PERMITS
            )));
        }
        if self.item_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "per-record timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// 10 concurrent inserts, 10 seconds each.
    fn default() -> Self {
        Self {
            concurrency_limit: 10,
            item_timeout: Duration::from_secs(10),
        }
    }
}

/// Events emitted by the pipeline for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Started {
        run_id: Uuid,
        total: usize,
        concurrency_limit: usize,
    },
    RecordPersisted {
        name: &'a str,
    },
    RecordFailed {
        failure: &'a PersistFailure,
    },
    Completed {
        summary: &'a RunSummary,
    },
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPipelineReporter;

impl PipelineReporter for TracingPipelineReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started {
                run_id,
                total,
                concurrency_limit,
            } => {
                tracing::info!(%run_id, %total, %concurrency_limit, "Persisting batch");
            }
            PipelineEvent::RecordPersisted { name } => {
                tracing::debug!(%name, "Record persisted");
            }
            PipelineEvent::RecordFailed { failure } => {
                tracing::warn!(name = %failure.name, reason = %failure.reason, "Record failed");
            }
            PipelineEvent::Completed { summary } => {
                tracing::info!(
                    run_id = %summary.run_id,
                    attempted = summary.attempted,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    elapsed_ms = summary.elapsed_ms,
                    "All database operations completed"
                );
            }
        }
    }
}

/// Writes batches of records through a [`RecordStore`] under a concurrency bound.
pub struct PersistPipeline<S: RecordStore> {
    store: S,
    config: PipelineConfig,
}

impl<S: RecordStore> PersistPipeline<S> {
    /// Fails with [`AppError::ConfigError`] if the limits are unusable.
    pub fn new(store: S, config: PipelineConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Persist every record in `batch` and block until each has an outcome.
    ///
    /// Per-record failures (store errors, timeouts, cancellation, panics in
    /// the store) are reported in the summary and never returned as `Err`.
    /// When `cancel` fires, records still waiting or in flight are reported
    /// as [`FailureReason::Cancelled`].
    pub async fn run<R: PipelineReporter>(
        &self,
        batch: Batch,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<RunSummary, AppError> {
        let started = Instant::now();
        let total = batch.len();
        let mut summary = RunSummary::new(Uuid::new_v4());

        reporter.report(PipelineEvent::Started {
            run_id: summary.run_id,
            total,
            concurrency_limit: self.config.concurrency_limit,
        });

        if batch.is_empty() {
            reporter.report(PipelineEvent::Completed { summary: &summary });
            return Ok(summary);
        }

        let gate = Arc::new(Semaphore::new(self.config.concurrency_limit));
        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(total);

        for record in batch {
            let name = record.name().to_string();
            let handle = tasks.spawn(persist_one(
                self.store.clone(),
                record,
                Arc::clone(&gate),
                self.config.item_timeout,
                cancel.clone(),
            ));
            names.insert(handle.id(), name);
        }

        // Completion barrier: drains until every task has reported.
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => {
                    let name = names.get(&e.id()).cloned().unwrap_or_default();
                    let message = if e.is_panic() {
                        "persist task panicked".to_string()
                    } else {
                        e.to_string()
                    };
                    PersistOutcome::failure(name, FailureReason::Aborted { message })
                }
            };

            match &outcome {
                PersistOutcome::Success { name } => {
                    reporter.report(PipelineEvent::RecordPersisted { name });
                }
                PersistOutcome::Failure(failure) => {
                    reporter.report(PipelineEvent::RecordFailed { failure });
                }
            }
            summary.record(outcome);
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        debug_assert_eq!(summary.attempted, total);
        debug_assert!(summary.is_consistent());

        reporter.report(PipelineEvent::Completed { summary: &summary });
        Ok(summary)
    }
}

/// Convenience wrapper: one-shot run with tracing output and no external cancellation.
pub async fn persist_batch<S: RecordStore>(
    store: S,
    batch: Batch,
    concurrency_limit: usize,
    item_timeout: Duration,
) -> Result<RunSummary, AppError> {
    let pipeline = PersistPipeline::new(store, PipelineConfig::new(concurrency_limit, item_timeout))?;
    pipeline
        .run(batch, &CancellationToken::new(), &TracingPipelineReporter)
        .await
}

async fn persist_one<S: RecordStore>(
    store: S,
    record: SalaryRecord,
    gate: Arc<Semaphore>,
    item_timeout: Duration,
    cancel: CancellationToken,
) -> PersistOutcome {
    let name = record.name().to_string();
    if cancel.is_cancelled() {
        return PersistOutcome::failure(name, FailureReason::Cancelled);
    }

    let attempt = async {
        // Held until this block finishes or is dropped by cancellation.
        let Ok(_permit) = gate.acquire().await else {
            return Err(FailureReason::Aborted {
                message: "admission gate closed".into(),
            });
        };

        match tokio::time::timeout(item_timeout, store.persist(&record)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FailureReason::Store {
                message: e.to_string(),
            }),
            Err(_) => Err(FailureReason::timed_out(item_timeout)),
        }
    };

    // A persist call that already finished wins over a concurrent cancel.
    let result = tokio::select! {
        biased;
        result = attempt => result,
        () = cancel.cancelled() => Err(FailureReason::Cancelled),
    };

    match result {
        Ok(()) => PersistOutcome::Success { name },
        Err(reason) => PersistOutcome::failure(name, reason),
    }
}
