//! Domain layer types for the harvesters.
//!
//! This module contains the records that flow through the jobs: CRM
//! mailbox threads and messages, the flattened rows written to the
//! warehouse, and backlink report entries.

mod backlink;
mod party;
mod thread;
mod types;

pub use backlink::{
    normalize_domain, BacklinkRecord, Refdomain, RefdomainRecord, ReportWindow,
    HIGH_AUTHORITY_RATING, MIN_DOMAIN_RATING,
};
pub use party::{Parties, Party, PartyInfo, PARTY_DELIMITER};
pub use thread::{EnrichedRecord, MailMessage, ThreadSummary};
pub use types::{DealId, ThreadId};
