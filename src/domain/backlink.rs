//! Backlink report types.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum source domain rating counted as a relevant referring domain.
pub const MIN_DOMAIN_RATING: f64 = 24.5;

/// Domain rating at which a referring domain counts as high authority.
pub const HIGH_AUTHORITY_RATING: f64 = 80.0;

/// The reporting period: the seven days up to and including yesterday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Builds the window relative to `today`: from the start of the day a
    /// week ago to the end of yesterday.
    pub fn ending_yesterday(today: NaiveDate) -> Self {
        let start_day = today - Duration::days(7);
        let end_day = today - Duration::days(1);
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self {
            start: start_day.and_time(NaiveTime::MIN).and_utc(),
            end: end_day.and_time(end_of_day).and_utc(),
        }
    }

    /// Start of the window as an API timestamp (`YYYY-MM-DDTHH:MM:SSZ`).
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// End of the window as an API timestamp (`YYYY-MM-DDTHH:MM:SSZ`).
    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// History selector covering the window (`since:YYYY-MM-DD`).
    pub fn history(&self) -> String {
        format!("since:{}", self.start.format("%Y-%m-%d"))
    }
}

/// One new backlink pointing at a monitored domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacklinkRecord {
    /// Monitored domain the link points at.
    pub domain: String,
    pub url_from: Option<String>,
    pub url_to: Option<String>,
    pub anchor: Option<String>,
    /// Domain rating of the linking site.
    pub domain_rating: Option<f64>,
    /// URL rating of the linking page.
    pub url_rating: Option<f64>,
    pub domain_traffic: Option<i64>,
    pub referring_domains: Option<i64>,
    pub linked_domains: Option<i64>,
    pub page_traffic: Option<i64>,
    pub keywords: Option<i64>,
    pub external_links: Option<i64>,
    pub is_dofollow: Option<bool>,
    pub is_nofollow: Option<bool>,
    pub is_ugc: Option<bool>,
    pub first_seen: Option<String>,
}

/// A referring domain with its rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refdomain {
    pub domain: String,
    pub domain_rating: f64,
}

/// Referring-domain counts for one monitored domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefdomainRecord {
    pub domain: String,
    /// New referring domains rated at least [`MIN_DOMAIN_RATING`].
    pub refdomains_25_plus: i64,
    /// Of those, the ones rated at least [`HIGH_AUTHORITY_RATING`].
    pub refdomains_80_plus: i64,
}

impl RefdomainRecord {
    /// Counts the referring domains reported for `domain`.
    pub fn tally(domain: impl Into<String>, refdomains: &[Refdomain]) -> Self {
        let high = refdomains
            .iter()
            .filter(|r| r.domain_rating >= HIGH_AUTHORITY_RATING)
            .count();
        Self {
            domain: domain.into(),
            refdomains_25_plus: refdomains.len() as i64,
            refdomains_80_plus: high as i64,
        }
    }
}

/// Strips the scheme prefix and trailing slash from a monitored domain.
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .strip_suffix('/')
        .unwrap_or(without_scheme)
        .to_string()
}
