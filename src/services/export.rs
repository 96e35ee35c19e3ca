//! End-to-end export jobs: harvest, then replace-write the warehouse.

use thiserror::Error;

use super::backlink_service::BacklinkService;
use super::harvest_service::{HarvestError, HarvestService};
use crate::domain::ReportWindow;
use crate::storage::{RecordSink, SinkError, TableData, TableId};

/// Errors that fail an export job.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Harvest(#[from] HarvestError),

    #[error("failed to write {table}: {source}")]
    Sink {
        table: TableId,
        #[source]
        source: SinkError,
    },
}

/// Replace-writes `data` into `table`, naming the table on failure.
async fn write_table(
    sink: &dyn RecordSink,
    table: &TableId,
    data: TableData,
) -> Result<usize, ExportError> {
    sink.replace(table, data).await.map_err(|source| {
        tracing::error!(table = %table, error = %source, "warehouse write failed");
        ExportError::Sink {
            table: table.clone(),
            source,
        }
    })
}

/// Destination tables of the backlink export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkTables {
    pub backlinks: TableId,
    pub refdomains: TableId,
}

/// What a backlink export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacklinkExportSummary {
    /// Rows written to the backlinks table, `None` if nothing was written.
    pub backlinks_written: Option<usize>,
    /// Rows written to the refdomains table, `None` if nothing was written.
    pub refdomains_written: Option<usize>,
    pub failed_domains: Vec<String>,
}

/// Harvests every mailbox thread and replaces `table` with the result.
///
/// The sink is only called after a successful harvest, so a failed run
/// leaves the previous table contents in place. An empty harvest empties
/// the table.
pub async fn export_threads(
    service: &HarvestService,
    sink: &dyn RecordSink,
    table: &TableId,
) -> Result<usize, ExportError> {
    let records = service.harvest().await?;
    let written = write_table(sink, table, TableData::from_rows(&records)).await?;
    tracing::info!(table = %table, rows = written, "thread export complete");
    Ok(written)
}

/// Collects backlink data for `domains` and writes each non-empty result
/// set to its table. Empty result sets leave their table untouched.
pub async fn export_backlinks(
    service: &BacklinkService,
    sink: &dyn RecordSink,
    domains: &[String],
    window: &ReportWindow,
    tables: &BacklinkTables,
) -> Result<BacklinkExportSummary, ExportError> {
    let report = service.collect(domains, window).await;
    let mut summary = BacklinkExportSummary {
        failed_domains: report.failed_domains,
        ..Default::default()
    };

    if report.backlinks.is_empty() {
        tracing::info!(table = %tables.backlinks, "no new backlinks, table left unchanged");
    } else {
        let data = TableData::from_rows(&report.backlinks);
        summary.backlinks_written = Some(write_table(sink, &tables.backlinks, data).await?);
    }

    if report.refdomains.is_empty() {
        tracing::info!(table = %tables.refdomains, "no refdomain counts, table left unchanged");
    } else {
        let data = TableData::from_rows(&report.refdomains);
        summary.refdomains_written = Some(write_table(sink, &tables.refdomains, data).await?);
    }

    if !summary.failed_domains.is_empty() {
        tracing::warn!(
            failed = summary.failed_domains.len(),
            "backlink export finished with skipped domains"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BacklinkRecord, Parties, Refdomain, ThreadId, ThreadSummary};
    use crate::providers::backlinks::MockBacklinkProvider;
    use crate::providers::mailbox::{MockMailboxProvider, ThreadPage};
    use crate::providers::ProviderError;
    use crate::services::HarvestSettings;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Sink that records every write.
    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(TableId, TableData)>>,
        fail: bool,
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        async fn replace(&self, table: &TableId, data: TableData) -> crate::storage::Result<usize> {
            if self.fail {
                return Err(SinkError::InvalidDestination("read-only".to_string()));
            }
            let rows = data.len();
            self.writes.lock().unwrap().push((table.clone(), data));
            Ok(rows)
        }
    }

    fn table(name: &str) -> TableId {
        TableId::new("proj", "crm", name).unwrap()
    }

    fn settings() -> HarvestSettings {
        HarvestSettings {
            detail_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            ..HarvestSettings::default()
        }
    }

    fn single(id: i64) -> ThreadSummary {
        ThreadSummary {
            id: ThreadId(id),
            subject: "Hello".to_string(),
            message_count: 1,
            deal_id: None,
            created_at: "2024-01-01 00:00:00".to_string(),
            snippet: String::new(),
            parties: Parties::default(),
        }
    }

    fn window() -> ReportWindow {
        ReportWindow::ending_yesterday(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap())
    }

    fn backlink_tables() -> BacklinkTables {
        BacklinkTables {
            backlinks: table("backlinks"),
            refdomains: table("refdomains"),
        }
    }

    #[tokio::test]
    async fn export_threads_writes_harvest() {
        let mut provider = MockMailboxProvider::new();
        provider.expect_fetch_page().times(1).returning(|_| {
            Ok(ThreadPage {
                threads: vec![single(1), single(2)],
                has_more: false,
                next_start: 2,
            })
        });
        let service = HarvestService::new(Arc::new(provider), settings());
        let sink = RecordingSink::default();

        let written = export_threads(&service, &sink, &table("threads"))
            .await
            .unwrap();

        assert_eq!(written, 2);
        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, table("threads"));
        assert_eq!(writes[0].1.len(), 2);
    }

    #[tokio::test]
    async fn export_threads_skips_sink_on_harvest_error() {
        let mut provider = MockMailboxProvider::new();
        provider
            .expect_fetch_page()
            .returning(|_| Err(ProviderError::Connection("refused".to_string())));
        let service = HarvestService::new(Arc::new(provider), settings());
        let sink = RecordingSink::default();

        let result = export_threads(&service, &sink, &table("threads")).await;

        assert!(matches!(result, Err(ExportError::Harvest(_))));
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_threads_reports_sink_failure() {
        let mut provider = MockMailboxProvider::new();
        provider
            .expect_fetch_page()
            .returning(|_| Ok(ThreadPage::default()));
        let service = HarvestService::new(Arc::new(provider), settings());
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let err = export_threads(&service, &sink, &table("threads"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Sink { .. }));
        assert!(err.to_string().contains("proj.crm.threads"));
    }

    #[tokio::test]
    async fn export_backlinks_sink_failure_names_table() {
        let mut provider = MockBacklinkProvider::new();
        provider.expect_fetch_backlinks().returning(|target, _| {
            Ok(vec![BacklinkRecord {
                domain: target.to_string(),
                ..Default::default()
            }])
        });
        provider.expect_fetch_refdomains().returning(|_, _| Ok(vec![]));
        let service = BacklinkService::new(Arc::new(provider));
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let err = export_backlinks(
            &service,
            &sink,
            &["one.com".to_string()],
            &window(),
            &backlink_tables(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to write proj.crm.backlinks: invalid destination: read-only"
        );
    }

    #[tokio::test]
    async fn export_backlinks_writes_both_tables() {
        let mut provider = MockBacklinkProvider::new();
        provider.expect_fetch_backlinks().returning(|target, _| {
            Ok(vec![BacklinkRecord {
                domain: target.to_string(),
                ..Default::default()
            }])
        });
        provider.expect_fetch_refdomains().returning(|_, _| {
            Ok(vec![Refdomain {
                domain: "a.org".to_string(),
                domain_rating: 90.0,
            }])
        });
        let service = BacklinkService::new(Arc::new(provider));
        let sink = RecordingSink::default();

        let summary = export_backlinks(
            &service,
            &sink,
            &["one.com".to_string()],
            &window(),
            &backlink_tables(),
        )
        .await
        .unwrap();

        assert_eq!(summary.backlinks_written, Some(1));
        assert_eq!(summary.refdomains_written, Some(1));
        let tables: Vec<TableId> = sink
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.0.clone())
            .collect();
        assert_eq!(tables, vec![table("backlinks"), table("refdomains")]);
    }

    #[tokio::test]
    async fn export_backlinks_skips_empty_sets() {
        let mut provider = MockBacklinkProvider::new();
        provider.expect_fetch_backlinks().returning(|_, _| Ok(vec![]));
        provider.expect_fetch_refdomains().returning(|_, _| Ok(vec![]));
        let service = BacklinkService::new(Arc::new(provider));
        let sink = RecordingSink::default();

        let summary = export_backlinks(
            &service,
            &sink,
            &["one.com".to_string()],
            &window(),
            &backlink_tables(),
        )
        .await
        .unwrap();

        // Refdomain tallies exist even with zero counts.
        assert_eq!(summary.backlinks_written, None);
        assert_eq!(summary.refdomains_written, Some(1));
        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, table("refdomains"));
    }

    #[tokio::test]
    async fn export_backlinks_all_domains_failing_writes_nothing() {
        let mut provider = MockBacklinkProvider::new();
        provider
            .expect_fetch_backlinks()
            .returning(|_, _| Err(ProviderError::RateLimited));
        provider.expect_fetch_refdomains().never();
        let service = BacklinkService::new(Arc::new(provider));
        let sink = RecordingSink::default();

        let summary = export_backlinks(
            &service,
            &sink,
            &["one.com".to_string(), "two.com".to_string()],
            &window(),
            &backlink_tables(),
        )
        .await
        .unwrap();

        assert_eq!(summary.failed_domains.len(), 2);
        assert!(sink.writes.lock().unwrap().is_empty());
    }
}
