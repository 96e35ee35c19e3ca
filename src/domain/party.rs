//! Thread participants and their flattened, warehouse-friendly form.

use serde::{Deserialize, Serialize};

/// Delimiter placed between joined party values.
pub const PARTY_DELIMITER: &str = ", ";

/// A contact attached to a thread or message in one role (to/from/cc/bcc).
///
/// Both fields are optional because the CRM omits or nulls them freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Email address.
    #[serde(default)]
    pub email_address: Option<String>,
    /// Display name (e.g., "Jane Doe").
    #[serde(default)]
    pub name: Option<String>,
}

impl Party {
    /// Creates a party with just an email address.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email_address: Some(email.into()),
            name: None,
        }
    }

    /// Creates a party with an email address and display name.
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email_address: Some(email.into()),
            name: Some(name.into()),
        }
    }
}

/// The four party groups of a thread or message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parties {
    pub to: Vec<Party>,
    pub from: Vec<Party>,
    pub cc: Vec<Party>,
    pub bcc: Vec<Party>,
}

/// Flattened form of a party list: every present email and name joined
/// with [`PARTY_DELIMITER`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyInfo {
    pub emails: String,
    pub names: String,
}

impl PartyInfo {
    /// Normalizes a possibly-absent party list.
    ///
    /// Absent and empty values are skipped rather than rendered as empty
    /// entries, so the output never carries stray delimiters.
    pub fn from_parties(parties: Option<&[Party]>) -> Self {
        let parties = parties.unwrap_or_default();
        Self {
            emails: join_present(parties.iter().map(|p| p.email_address.as_deref())),
            names: join_present(parties.iter().map(|p| p.name.as_deref())),
        }
    }
}

fn join_present<'a>(values: impl Iterator<Item = Option<&'a str>>) -> String {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(PARTY_DELIMITER)
}
