//! Core identifier types for domain entities.
//!
//! These newtype wrappers keep CRM identifiers from being mixed up with
//! counts and offsets, which are plain integers on the wire as well.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a mailbox thread (conversation) in the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub i64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ThreadId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of the CRM deal a thread is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub i64);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DealId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
