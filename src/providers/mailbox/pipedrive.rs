//! Pipedrive mailbox provider implementation.
//!
//! This module provides a [`MailboxProvider`] implementation using the
//! Pipedrive REST API v1:
//! - `GET /v1/mailbox/mailThreads` for paginated thread summaries
//! - `GET /v1/mailbox/mailThreads/{id}/mailMessages` for the messages of a thread
//!
//! # Decoding
//!
//! Pipedrive omits or nulls fields liberally, so every field of the wire
//! types is optional. Decoding only fails when the payload is not the JSON
//! object shape the endpoint documents.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::Deserialize;

use super::{MailboxProvider, ThreadPage};
use crate::domain::{DealId, MailMessage, Parties, Party, ThreadId, ThreadSummary};
use crate::providers::error::decode_response;
use crate::providers::{ProviderError, Result};

/// Default base URL of the Pipedrive API.
pub const PIPEDRIVE_API_BASE: &str = "https://api.pipedrive.com";

/// Number of threads requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Mailbox folder listed unless configured otherwise.
pub const DEFAULT_FOLDER: &str = "sent";

const THREADS_PATH: &str = "/v1/mailbox/mailThreads";
const API_TOKEN_HEADER: &str = "x-api-token";

/// Thread list response.
#[derive(Debug, Deserialize)]
struct ThreadListResponse {
    data: Option<Vec<Option<PipedriveThread>>>,
    additional_data: Option<AdditionalData>,
}

#[derive(Debug, Deserialize)]
struct AdditionalData {
    pagination: Option<PaginationData>,
}

#[derive(Debug, Deserialize)]
struct PaginationData {
    more_items_in_collection: Option<bool>,
    next_start: Option<u32>,
}

/// Pipedrive mail thread.
#[derive(Debug, Deserialize)]
struct PipedriveThread {
    id: Option<i64>,
    subject: Option<String>,
    message_count: Option<i64>,
    deal_id: Option<i64>,
    add_time: Option<String>,
    snippet: Option<String>,
    parties: Option<PipedriveParties>,
}

/// Party groups of a thread.
#[derive(Debug, Deserialize)]
struct PipedriveParties {
    to: Option<Vec<Option<Party>>>,
    from: Option<Vec<Option<Party>>>,
    cc: Option<Vec<Option<Party>>>,
    bcc: Option<Vec<Option<Party>>>,
}

/// Message list response.
#[derive(Debug, Deserialize)]
struct MessageListResponse {
    data: Option<Vec<Option<PipedriveMessage>>>,
}

/// Pipedrive mail message.
#[derive(Debug, Deserialize)]
struct PipedriveMessage {
    from: Option<Vec<Option<Party>>>,
    to: Option<Vec<Option<Party>>>,
    cc: Option<Vec<Option<Party>>>,
    bcc: Option<Vec<Option<Party>>>,
    subject: Option<String>,
    snippet: Option<String>,
    add_time: Option<String>,
}

fn party_list(parties: Option<Vec<Option<Party>>>) -> Vec<Party> {
    parties.unwrap_or_default().into_iter().flatten().collect()
}

impl PipedriveThread {
    /// Converts the wire thread into a summary. Threads without an id cannot
    /// be keyed and are rejected.
    fn into_summary(self) -> Option<ThreadSummary> {
        let id = ThreadId(self.id?);
        let parties = self.parties.map_or_else(Parties::default, |p| Parties {
            to: party_list(p.to),
            from: party_list(p.from),
            cc: party_list(p.cc),
            bcc: party_list(p.bcc),
        });

        Some(ThreadSummary {
            id,
            subject: self.subject.unwrap_or_default(),
            message_count: self
                .message_count
                .unwrap_or(1)
                .clamp(1, i64::from(u32::MAX)) as u32,
            deal_id: self.deal_id.map(DealId),
            created_at: self.add_time.unwrap_or_default(),
            snippet: self.snippet.unwrap_or_default(),
            parties,
        })
    }
}

impl From<PipedriveMessage> for MailMessage {
    fn from(msg: PipedriveMessage) -> Self {
        Self {
            subject: msg.subject.unwrap_or_default(),
            snippet: msg.snippet.unwrap_or_default(),
            add_time: msg.add_time.unwrap_or_default(),
            parties: Parties {
                to: party_list(msg.to),
                from: party_list(msg.from),
                cc: party_list(msg.cc),
                bcc: party_list(msg.bcc),
            },
        }
    }
}

/// Pipedrive mailbox provider.
///
/// Lists threads of a single mailbox folder (`sent` by default) and
/// fetches per-thread messages. Owns its HTTP client; construct one per run
/// and share it by reference.
///
/// # Example
///
/// ```ignore
/// use harvest::providers::mailbox::{MailboxProvider, PipedriveProvider};
///
/// let provider = PipedriveProvider::new("api-token");
/// let page = provider.fetch_page(0).await?;
/// ```
pub struct PipedriveProvider {
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// Base URL the API paths are appended to, without a trailing slash.
    base_url: String,
    /// API token sent with every request.
    api_token: String,
    /// Mailbox folder to list.
    folder: String,
    /// Threads requested per page.
    page_size: u32,
}

impl PipedriveProvider {
    /// Creates a provider against the public Pipedrive API.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self::with_base_url(api_token, PIPEDRIVE_API_BASE)
    }

    /// Creates a provider against a custom base URL (proxies, tests).
    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            folder: DEFAULT_FOLDER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the mailbox folder to list.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Sets the number of threads requested per page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the configured page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_TOKEN_HEADER),
            HeaderValue::from_str(&self.api_token)
                .map_err(|e| ProviderError::InvalidRequest(format!("invalid api token: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Makes an authenticated GET request to the Pipedrive API.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        decode_response(response).await
    }
}

#[async_trait]
impl MailboxProvider for PipedriveProvider {
    async fn fetch_page(&self, start: u32) -> Result<ThreadPage> {
        let query = [
            ("folder", self.folder.clone()),
            ("start", start.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        let response: ThreadListResponse = self.get(THREADS_PATH, &query).await?;

        let threads: Vec<ThreadSummary> = response
            .data
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|thread| {
                let summary = thread.into_summary();
                if summary.is_none() {
                    tracing::warn!(start, "skipping thread without an id");
                }
                summary
            })
            .collect();

        let pagination = response.additional_data.and_then(|d| d.pagination);
        let has_more = pagination
            .as_ref()
            .and_then(|p| p.more_items_in_collection)
            .unwrap_or(false);
        let next_start = pagination
            .and_then(|p| p.next_start)
            .unwrap_or(start + threads.len() as u32);

        tracing::debug!(start, count = threads.len(), has_more, next_start, "fetched thread page");

        Ok(ThreadPage {
            threads,
            has_more,
            next_start,
        })
    }

    async fn fetch_messages(&self, thread_id: ThreadId) -> Result<Vec<MailMessage>> {
        let path = format!("{}/{}/mailMessages", THREADS_PATH, thread_id);
        let response: MessageListResponse = self.get(&path, &[]).await?;

        Ok(response
            .data
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(MailMessage::from)
            .collect())
    }
}
