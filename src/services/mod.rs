//! Business services layer.
//!
//! Services sit between the command line and the infrastructure layer:
//!
//! ```text
//!        CLI (harvest threads | harvest backlinks)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Providers, Storage)
//! ```
//!
//! # Services Overview
//!
//! - [`HarvestService`]: Walks the mailbox thread list and enriches multi-message threads
//! - [`BacklinkService`]: Collects backlink data per monitored domain
//! - [`export_threads`] / [`export_backlinks`]: Run a service and replace-write the results

mod backlink_service;
mod export;
mod harvest_service;

pub use backlink_service::{BacklinkReport, BacklinkService};
pub use export::{
    export_backlinks, export_threads, BacklinkExportSummary, BacklinkTables, ExportError,
};
pub use harvest_service::{DetailFetchError, HarvestError, HarvestService, HarvestSettings};
