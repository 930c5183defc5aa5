pub mod error;
pub mod ingest;
pub mod layout;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod retry;
pub mod summary;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::AppError;
pub use ingest::{IngestReport, IngestService};
pub use layout::{SalarySource, TableLayout};
pub use models::{Batch, RecordKind, SEASONS, SalaryRecord, StoredSalary};
pub use normalize::{amount_field, clean_amount};
pub use pipeline::{
    PersistPipeline, PipelineConfig, PipelineEvent, PipelineReporter, TracingPipelineReporter,
    persist_batch,
};
pub use retry::{RetryPolicy, RetryingStore};
pub use summary::{FailureReason, PersistFailure, PersistOutcome, RunSummary};
pub use traits::{Fetcher, NullStore, RecordExtractor, RecordStore};
