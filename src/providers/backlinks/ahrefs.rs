//! Ahrefs API provider implementation.
//!
//! Uses the site explorer endpoints of the Ahrefs API v3:
//! - `GET /v3/site-explorer/all-backlinks` for new backlinks of a target
//! - `GET /v3/site-explorer/refdomains` for new referring domains
//!
//! Filtering happens server side through the JSON `where` parameter, so only
//! links that pass the quality thresholds are transferred.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use super::BacklinkProvider;
use crate::domain::{BacklinkRecord, Refdomain, ReportWindow, MIN_DOMAIN_RATING};
use crate::providers::error::decode_response;
use crate::providers::{ProviderError, Result};

/// Default base URL of the Ahrefs API.
pub const AHREFS_API_BASE: &str = "https://api.ahrefs.com";

const BACKLINKS_PATH: &str = "/v3/site-explorer/all-backlinks";
const REFDOMAINS_PATH: &str = "/v3/site-explorer/refdomains";

/// Minimum organic traffic of the linking domain.
const MIN_DOMAIN_TRAFFIC: i64 = 500;

const BACKLINK_COLUMNS: &str = "url_from,url_to,anchor,domain_rating_source,url_rating_source,\
traffic_domain,refdomains_source,linked_domains_source_page,traffic,positions,links_external,\
is_dofollow,is_nofollow,is_ugc,first_seen_link";

const REFDOMAIN_COLUMNS: &str = "domain,domain_rating";

#[derive(Debug, Deserialize)]
struct BacklinksResponse {
    backlinks: Option<Vec<AhrefsBacklink>>,
}

/// Ahrefs backlink entry.
#[derive(Debug, Deserialize)]
struct AhrefsBacklink {
    url_from: Option<String>,
    url_to: Option<String>,
    anchor: Option<String>,
    domain_rating_source: Option<f64>,
    url_rating_source: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    traffic_domain: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    refdomains_source: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    linked_domains_source_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    traffic: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    positions: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    links_external: Option<i64>,
    is_dofollow: Option<bool>,
    is_nofollow: Option<bool>,
    is_ugc: Option<bool>,
    first_seen_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefdomainsResponse {
    refdomains: Option<Vec<AhrefsRefdomain>>,
}

#[derive(Debug, Deserialize)]
struct AhrefsRefdomain {
    domain: Option<String>,
    domain_rating: Option<f64>,
}

/// Accepts integers that the API sometimes reports as floats.
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))))
}

impl AhrefsBacklink {
    fn into_record(self, domain: &str) -> BacklinkRecord {
        BacklinkRecord {
            domain: domain.to_string(),
            url_from: self.url_from,
            url_to: self.url_to,
            anchor: self.anchor,
            domain_rating: self.domain_rating_source,
            url_rating: self.url_rating_source,
            domain_traffic: self.traffic_domain,
            referring_domains: self.refdomains_source,
            linked_domains: self.linked_domains_source_page,
            page_traffic: self.traffic,
            keywords: self.positions,
            external_links: self.links_external,
            is_dofollow: self.is_dofollow,
            is_nofollow: self.is_nofollow,
            is_ugc: self.is_ugc,
            first_seen: self.first_seen_link,
        }
    }
}

/// Filter for new, live, content backlinks from reasonably strong sites.
fn backlinks_filter(window: &ReportWindow) -> Value {
    json!({
        "and": [
            { "field": "is_content", "is": ["eq", 1] },
            { "field": "domain_rating_source", "is": ["gte", MIN_DOMAIN_RATING] },
            { "field": "traffic_domain", "is": ["gte", MIN_DOMAIN_TRAFFIC] },
            { "field": "first_seen_link", "is": ["gte", window.start_iso()] },
            { "field": "first_seen_link", "is": ["lte", window.end_iso()] },
            { "field": "last_seen", "is": "is_null" }
        ]
    })
}

/// Filter for referring domains first seen in the window.
fn refdomains_filter(window: &ReportWindow) -> Value {
    json!({
        "and": [
            { "field": "domain_rating", "is": ["gte", MIN_DOMAIN_RATING] },
            { "field": "first_seen", "is": ["gte", window.start_iso()] },
            { "field": "first_seen", "is": ["lte", window.end_iso()] }
        ]
    })
}

/// Ahrefs API provider authenticated with a bearer API key.
pub struct AhrefsProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AhrefsProvider {
    /// Creates a provider against the public Ahrefs API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, AHREFS_API_BASE)
    }

    /// Creates a provider against a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| ProviderError::InvalidRequest(format!("invalid header: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, application/xml"),
        );
        Ok(headers)
    }

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
impl BacklinkProvider for AhrefsProvider {
    async fn fetch_backlinks(
        &self,
        target: &str,
        window: &ReportWindow,
    ) -> Result<Vec<BacklinkRecord>> {
        let query = [
            ("history", window.history()),
            ("target", target.to_string()),
            ("where", backlinks_filter(window).to_string()),
            ("select", BACKLINK_COLUMNS.to_string()),
        ];
        let response: BacklinksResponse = self.get(BACKLINKS_PATH, &query).await?;

        Ok(response
            .backlinks
            .unwrap_or_default()
            .into_iter()
            .map(|b| b.into_record(target))
            .collect())
    }

    async fn fetch_refdomains(
        &self,
        target: &str,
        window: &ReportWindow,
    ) -> Result<Vec<Refdomain>> {
        let query = [
            ("history", window.history()),
            ("target", target.to_string()),
            ("where", refdomains_filter(window).to_string()),
            ("select", REFDOMAIN_COLUMNS.to_string()),
        ];
        let response: RefdomainsResponse = self.get(REFDOMAINS_PATH, &query).await?;

        Ok(response
            .refdomains
            .unwrap_or_default()
            .into_iter()
            .map(|r| Refdomain {
                domain: r.domain.unwrap_or_default(),
                domain_rating: r.domain_rating.unwrap_or_default(),
            })
            .collect())
    }
}
