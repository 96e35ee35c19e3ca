//! Backlink-analytics provider implementations.
//!
//! - [`AhrefsProvider`] - Ahrefs API v3 site explorer

mod ahrefs;
mod traits;

pub use ahrefs::{AhrefsProvider, AHREFS_API_BASE};
pub use traits::BacklinkProvider;

#[cfg(test)]
pub use traits::MockBacklinkProvider;
