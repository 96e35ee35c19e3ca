//! Backlink provider trait definition.

use async_trait::async_trait;

use crate::domain::{BacklinkRecord, Refdomain, ReportWindow};
use crate::providers::Result;

/// Trait for backlink-analytics implementations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BacklinkProvider: Send + Sync {
    /// Fetches the new content backlinks of `target` first seen in `window`.
    async fn fetch_backlinks(
        &self,
        target: &str,
        window: &ReportWindow,
    ) -> Result<Vec<BacklinkRecord>>;

    /// Fetches the referring domains of `target` first seen in `window`.
    async fn fetch_refdomains(&self, target: &str, window: &ReportWindow)
        -> Result<Vec<Refdomain>>;
}
