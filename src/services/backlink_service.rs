//! Backlink monitoring service.
//!
//! Collects new backlinks and referring-domain counts for a list of
//! monitored domains over a [`ReportWindow`].

use std::sync::Arc;

use crate::domain::{BacklinkRecord, RefdomainRecord, ReportWindow};
use crate::providers::backlinks::BacklinkProvider;

/// Output of one backlink collection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacklinkReport {
    /// New backlinks across all domains, grouped by domain in input order.
    pub backlinks: Vec<BacklinkRecord>,
    /// One referring-domain tally per domain whose refdomain request succeeded.
    pub refdomains: Vec<RefdomainRecord>,
    /// Domains with at least one failed provider request.
    pub failed_domains: Vec<String>,
}

/// Service collecting backlink data per monitored domain.
pub struct BacklinkService {
    provider: Arc<dyn BacklinkProvider>,
}

impl BacklinkService {
    /// Creates a new BacklinkService.
    pub fn new(provider: Arc<dyn BacklinkProvider>) -> Self {
        Self { provider }
    }

    /// Collects the report for `domains`, one domain at a time.
    ///
    /// Backlinks of a domain are kept as soon as they arrive, so a failed
    /// refdomain request only loses that domain's tally. Every domain with a
    /// failed request is logged and listed in `failed_domains`.
    pub async fn collect(&self, domains: &[String], window: &ReportWindow) -> BacklinkReport {
        let mut report = BacklinkReport::default();

        for domain in domains {
            let backlinks = match self.provider.fetch_backlinks(domain, window).await {
                Ok(backlinks) => backlinks,
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "skipping domain");
                    report.failed_domains.push(domain.clone());
                    continue;
                }
            };
            let found = backlinks.len();
            report.backlinks.extend(backlinks);

            match self.provider.fetch_refdomains(domain, window).await {
                Ok(refdomains) => {
                    let tally = RefdomainRecord::tally(domain.as_str(), &refdomains);
                    tracing::info!(
                        domain = %domain,
                        backlinks = found,
                        refdomains_25_plus = tally.refdomains_25_plus,
                        refdomains_80_plus = tally.refdomains_80_plus,
                        "collected backlink data"
                    );
                    report.refdomains.push(tally);
                }
                Err(e) => {
                    tracing::warn!(
                        domain = %domain,
                        backlinks = found,
                        error = %e,
                        "refdomain fetch failed, keeping backlinks only"
                    );
                    report.failed_domains.push(domain.clone());
                }
            }
        }

        report
    }
}
