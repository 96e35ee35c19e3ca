//! Thread domain types.
//!
//! Represents mailbox threads as the CRM lists them, the individual
//! messages fetched for multi-message threads, and the flattened record
//! that lands in the warehouse.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DealId, Parties, PartyInfo, ThreadId};

/// Timestamp layout the CRM uses for `add_time` values (UTC).
const CRM_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A thread as returned by one page of the thread list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    /// Unique identifier for this thread.
    pub id: ThreadId,
    /// Thread subject.
    pub subject: String,
    /// Total number of messages in the thread. Always at least 1.
    pub message_count: u32,
    /// Deal this thread is linked to, if any.
    pub deal_id: Option<DealId>,
    /// Creation timestamp exactly as the CRM reported it.
    pub created_at: String,
    /// Short preview of the thread content.
    pub snippet: String,
    /// Participants of the thread.
    pub parties: Parties,
}

impl ThreadSummary {
    /// Returns true if the summary alone is enough to build a record.
    pub fn is_single_message(&self) -> bool {
        self.message_count <= 1
    }
}

/// A single message of a thread, as returned by the message endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub subject: String,
    pub snippet: String,
    pub add_time: String,
    pub parties: Parties,
}

/// The canonical output row: one per harvested thread.
///
/// Party groups are flattened into comma-joined email strings so the row
/// can be written to a flat warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub thread_id: ThreadId,
    pub subject: String,
    pub message_count: u32,
    pub deal_id: Option<DealId>,
    pub created_at: String,
    pub snippet: String,
    pub to_emails: String,
    pub from_emails: String,
    pub cc_emails: String,
    pub bcc_emails: String,
}

impl EnrichedRecord {
    /// Builds a record straight from a thread summary.
    pub fn from_summary(summary: &ThreadSummary) -> Self {
        let parties = &summary.parties;
        Self {
            thread_id: summary.id,
            subject: summary.subject.clone(),
            message_count: summary.message_count,
            deal_id: summary.deal_id,
            created_at: summary.created_at.clone(),
            snippet: summary.snippet.clone(),
            to_emails: PartyInfo::from_parties(Some(&parties.to)).emails,
            from_emails: PartyInfo::from_parties(Some(&parties.from)).emails,
            cc_emails: PartyInfo::from_parties(Some(&parties.cc)).emails,
            bcc_emails: PartyInfo::from_parties(Some(&parties.bcc)).emails,
        }
    }

    /// Merges a summary's identity fields with its first message.
    ///
    /// A thread whose message list came back empty still yields a record,
    /// with empty content fields.
    pub fn from_first_message(summary: &ThreadSummary, first: Option<&MailMessage>) -> Self {
        let empty = MailMessage::default();
        let message = first.unwrap_or(&empty);
        let parties = &message.parties;
        Self {
            thread_id: summary.id,
            subject: message.subject.clone(),
            message_count: summary.message_count,
            deal_id: summary.deal_id,
            created_at: message.add_time.clone(),
            snippet: message.snippet.clone(),
            to_emails: PartyInfo::from_parties(Some(&parties.to)).emails,
            from_emails: PartyInfo::from_parties(Some(&parties.from)).emails,
            cc_emails: PartyInfo::from_parties(Some(&parties.cc)).emails,
            bcc_emails: PartyInfo::from_parties(Some(&parties.bcc)).emails,
        }
    }

    /// Parses `created_at` as a UTC timestamp.
    ///
    /// Accepts the CRM's `YYYY-MM-DD HH:MM:SS` layout and RFC 3339.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, CRM_TIMESTAMP_FORMAT) {
            return Some(naive.and_utc());
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
