//! Mailbox provider trait definition.
//!
//! This module defines the [`MailboxProvider`] trait which abstracts over the
//! CRM mailbox API. The harvest service only talks to this trait, so tests can
//! substitute fakes and the HTTP client is constructed and owned explicitly by
//! the caller.

use async_trait::async_trait;

use crate::domain::{MailMessage, ThreadId, ThreadSummary};
use crate::providers::Result;

/// One page of the thread list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadPage {
    /// Threads on this page.
    pub threads: Vec<ThreadSummary>,
    /// Whether the collection continues past this page.
    pub has_more: bool,
    /// Offset of the next page. Only meaningful when `has_more` is set.
    pub next_start: u32,
}

/// Trait for CRM mailbox implementations.
///
/// Implementations issue exactly one request per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    /// Fetches one page of thread summaries starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`](crate::providers::ProviderError) if the
    /// request fails or the API answers with a non-success status.
    async fn fetch_page(&self, start: u32) -> Result<ThreadPage>;

    /// Fetches the messages of a single thread, oldest first.
    async fn fetch_messages(&self, thread_id: ThreadId) -> Result<Vec<MailMessage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_page_default_has_no_more() {
        let page = ThreadPage::default();
        assert!(page.threads.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.next_start, 0);
    }
}
