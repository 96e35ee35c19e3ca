//! CRM mailbox provider implementations.
//!
//! This module contains the [`MailboxProvider`] trait and the
//! [`PipedriveProvider`] that implements it against the Pipedrive REST API.
//!
//! # Example
//!
//! ```ignore
//! use harvest::providers::mailbox::{MailboxProvider, PipedriveProvider};
//!
//! async fn first_page(provider: &dyn MailboxProvider) {
//!     let page = provider.fetch_page(0).await.expect("failed to fetch threads");
//!     for thread in page.threads {
//!         println!("{}: {}", thread.id, thread.subject);
//!     }
//! }
//! ```

mod pipedrive;
mod traits;

pub use pipedrive::{PipedriveProvider, DEFAULT_FOLDER, DEFAULT_PAGE_SIZE, PIPEDRIVE_API_BASE};
pub use traits::{MailboxProvider, ThreadPage};

#[cfg(test)]
pub use traits::MockMailboxProvider;
