use std::future::Future;

use crate::error::AppError;
use crate::models::SalaryRecord;

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns a fetched HTML document into salary records.
///
/// A document whose structure does not match yields an empty batch.
pub trait RecordExtractor: Send + Sync + Clone {
    fn extract(&self, html: &str) -> Vec<SalaryRecord>;
}

/// Persists a single record.
///
/// Each call is independent; the pipeline may invoke many concurrently and
/// does not retry. Conflict and retry policy belong to the implementation.
pub trait RecordStore: Send + Sync + Clone + 'static {
    fn persist(
        &self,
        record: &SalaryRecord,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A no-op RecordStore for dry runs.
#[derive(Debug, Clone)]
pub struct NullStore;

impl RecordStore for NullStore {
    async fn persist(&self, _record: &SalaryRecord) -> Result<(), AppError> {
        Ok(())
    }
}
