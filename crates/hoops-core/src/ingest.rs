use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::RecordKind;
use crate::pipeline::{PersistPipeline, PipelineReporter};
use crate::summary::RunSummary;
use crate::traits::{Fetcher, RecordExtractor, RecordStore};

/// Outcome of ingesting one page.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub kind: RecordKind,
    pub url: String,
    pub records_found: usize,
    pub summary: RunSummary,
}

/// Orchestrates one page: fetch → extract → persist.
///
/// Generic over all external dependencies via traits, enabling dependency injection
/// and testability without real HTTP or database calls.
pub struct IngestService<F, E, S>
where
    F: Fetcher,
    E: RecordExtractor,
    S: RecordStore,
{
    kind: RecordKind,
    fetcher: F,
    extractor: E,
    pipeline: PersistPipeline<S>,
}

impl<F, E, S> IngestService<F, E, S>
where
    F: Fetcher,
    E: RecordExtractor,
    S: RecordStore,
{
    pub fn new(kind: RecordKind, fetcher: F, extractor: E, pipeline: PersistPipeline<S>) -> Self {
        Self {
            kind,
            fetcher,
            extractor,
            pipeline,
        }
    }

    /// Run the page through the pipeline.
    ///
    /// A failed fetch is logged and treated as a page with no records.
    /// Only cancellation during the fetch and pipeline setup errors return `Err`.
    pub async fn ingest<R: PipelineReporter>(
        &self,
        url: &str,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<IngestReport, AppError> {
        tracing::info!(kind = %self.kind, "Visiting {}", url);
        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AppError::Cancelled),
            fetched = self.fetcher.fetch(url) => fetched,
        };

        let batch = match fetched {
            Ok(html) => {
                tracing::debug!("Fetched {} bytes of HTML", html.len());
                self.extractor.extract(&html)
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "Error while scraping, no records available");
                Vec::new()
            }
        };

        let records_found = batch.len();
        tracing::info!(%url, %records_found, "Scraping complete");

        let summary = self.pipeline.run(batch, cancel, reporter).await?;

        Ok(IngestReport {
            kind: self.kind,
            url: url.to_string(),
            records_found,
            summary,
        })
    }
}
