//! Harvest service for mailbox threads.
//!
//! The [`HarvestService`] walks the paginated thread list of a
//! [`MailboxProvider`] and turns every thread into an [`EnrichedRecord`].
//! Single-message threads are complete as listed; threads with more messages
//! are enriched from their first message through a bounded pool of
//! concurrent detail requests.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{EnrichedRecord, ThreadId, ThreadSummary};
use crate::providers::mailbox::MailboxProvider;
use crate::providers::ProviderError;

/// Errors that end a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A page of the thread list could not be fetched. Records accumulated
    /// so far are discarded.
    #[error("failed to fetch thread page at offset {start}: {source}")]
    Page {
        start: u32,
        #[source]
        source: ProviderError,
    },
}

/// Failure to enrich a single thread. Logged and dropped, never fatal.
#[derive(Debug, Error)]
#[error("failed to fetch messages for thread {thread_id}: {source}")]
pub struct DetailFetchError {
    pub thread_id: ThreadId,
    #[source]
    pub source: ProviderError,
}

/// Settings for harvest behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    /// Maximum number of pages fetched in one run.
    pub max_pages: u32,
    /// Maximum number of detail requests in flight.
    pub detail_concurrency: usize,
    /// Delay before each detail request.
    pub detail_delay: Duration,
    /// Delay between consecutive page requests.
    pub page_delay: Duration,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            max_pages: 100,
            detail_concurrency: 5,
            detail_delay: Duration::from_millis(100),
            page_delay: Duration::from_millis(200),
        }
    }
}

/// Harvests mailbox threads into flat records.
///
/// Pages are fetched strictly one after another; enrichment of a page
/// finishes before the next page is requested.
///
/// # Example
///
/// ```ignore
/// let provider = Arc::new(PipedriveProvider::new(token));
/// let service = HarvestService::new(provider, HarvestSettings::default());
/// let records = service.harvest().await?;
/// ```
pub struct HarvestService {
    provider: Arc<dyn MailboxProvider>,
    settings: HarvestSettings,
}

impl HarvestService {
    /// Creates a new HarvestService.
    pub fn new(provider: Arc<dyn MailboxProvider>, settings: HarvestSettings) -> Self {
        Self { provider, settings }
    }

    /// Runs the harvest to completion.
    ///
    /// Returns every record that survived enrichment. Hitting the page
    /// ceiling while the provider still reports more data is logged and the
    /// partial result is returned.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Page`] on the first page that fails.
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn harvest(&self) -> Result<Vec<EnrichedRecord>, HarvestError> {
        let started = std::time::Instant::now();
        let mut records = Vec::new();
        let mut start = 0;
        let mut pages = 0u32;

        loop {
            let page = self.provider.fetch_page(start).await.map_err(|source| {
                tracing::error!(start, error = %source, "thread page fetch failed");
                HarvestError::Page { start, source }
            })?;
            pages += 1;

            let (singles, multi): (Vec<ThreadSummary>, Vec<ThreadSummary>) = page
                .threads
                .into_iter()
                .partition(ThreadSummary::is_single_message);

            records.extend(singles.iter().map(EnrichedRecord::from_summary));
            if !multi.is_empty() {
                records.extend(self.fetch_details(&multi).await);
            }

            tracing::debug!(
                start,
                singles = singles.len(),
                enriched = multi.len(),
                total = records.len(),
                "processed thread page"
            );

            if !page.has_more {
                break;
            }
            if pages >= self.settings.max_pages {
                tracing::warn!(
                    max_pages = self.settings.max_pages,
                    next_start = page.next_start,
                    "reached the maximum number of pages, stopping with partial data"
                );
                break;
            }

            start = page.next_start;
            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        }

        tracing::info!(
            pages,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "harvest complete"
        );
        Ok(records)
    }

    /// Enriches the multi-message threads among `threads`.
    ///
    /// Runs up to `detail_concurrency` requests at once. Results arrive in
    /// completion order; threads whose detail request fails are logged and
    /// left out.
    pub async fn fetch_details(&self, threads: &[ThreadSummary]) -> Vec<EnrichedRecord> {
        let width = self.settings.detail_concurrency.max(1);

        stream::iter(threads.iter().filter(|t| !t.is_single_message()))
            .map(|summary| self.enrich(summary))
            .buffer_unordered(width)
            .filter_map(|result| async move {
                match result {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(
                            thread_id = %e.thread_id,
                            error = %e.source,
                            "dropping thread after failed detail fetch"
                        );
                        None
                    }
                }
            })
            .collect()
            .await
    }

    /// Fetches one thread's messages and merges the first into a record.
    async fn enrich(&self, summary: &ThreadSummary) -> Result<EnrichedRecord, DetailFetchError> {
        if !self.settings.detail_delay.is_zero() {
            tokio::time::sleep(self.settings.detail_delay).await;
        }

        let messages = self
            .provider
            .fetch_messages(summary.id)
            .await
            .map_err(|source| DetailFetchError {
                thread_id: summary.id,
                source,
            })?;

        Ok(EnrichedRecord::from_first_message(summary, messages.first()))
    }
}
