//! External API provider implementations.
//!
//! This module contains provider traits and implementations for the
//! third-party services the jobs read from:
//!
//! - [`mailbox`] - CRM mailbox threads (Pipedrive)
//! - [`backlinks`] - Backlink analytics (Ahrefs)

pub mod backlinks;
mod error;
pub mod mailbox;

pub use error::{ProviderError, Result};
