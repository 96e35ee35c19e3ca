//! Integration tests for the export jobs.
//!
//! These tests run the real providers against wiremock servers and write
//! into a SQLite warehouse, covering the path from HTTP payloads to stored
//! rows. Each module contains its own unit tests for detailed logic.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use harvest::domain::ReportWindow;
use harvest::providers::backlinks::AhrefsProvider;
use harvest::providers::mailbox::PipedriveProvider;
use harvest::services::{
    export_backlinks, export_threads, BacklinkService, BacklinkTables, ExportError,
    HarvestService, HarvestSettings,
};
use harvest::storage::{SqliteWarehouse, TableId};

// ============================================================================
// Helpers
// ============================================================================

fn fast_settings() -> HarvestSettings {
    HarvestSettings {
        detail_delay: Duration::ZERO,
        page_delay: Duration::ZERO,
        ..HarvestSettings::default()
    }
}

fn threads_table() -> TableId {
    TableId::new("proj", "crm", "threads").unwrap()
}

fn thread(id: i64, message_count: i64, subject: &str) -> serde_json::Value {
    let deal_id = (id % 2 == 0).then_some(id * 100);
    json!({
        "id": id,
        "subject": subject,
        "message_count": message_count,
        "deal_id": deal_id,
        "add_time": "2024-02-01 10:00:00",
        "snippet": format!("snippet {}", id),
        "parties": {
            "to": [{"email_address": format!("lead{}@example.com", id), "name": "Lead"}],
            "from": [{"email_address": "sales@example.com", "name": "Sales"}],
            "cc": [],
            "bcc": null
        }
    })
}

fn thread_page(
    threads: Vec<serde_json::Value>,
    more: bool,
    next_start: u32,
) -> serde_json::Value {
    json!({
        "success": true,
        "data": threads,
        "additional_data": {
            "pagination": {
                "start": 0,
                "limit": 30,
                "more_items_in_collection": more,
                "next_start": next_start
            }
        }
    })
}

async fn mount_thread_page(server: &MockServer, start: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v1/mailbox/mailThreads"))
        .and(query_param("start", start))
        .and(header("x-api-token", "token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn rows(warehouse: &SqliteWarehouse, sql: &'static str) -> Vec<(i64, String, String)> {
    warehouse
        .db()
        .with_conn(move |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .unwrap()
}

// ============================================================================
// Thread Export Tests
// ============================================================================

#[tokio::test]
async fn thread_export_end_to_end() {
    let server = MockServer::start().await;

    mount_thread_page(
        &server,
        "0",
        thread_page(vec![thread(1, 1, "Intro"), thread(2, 3, "Proposal")], true, 2),
    )
    .await;
    mount_thread_page(
        &server,
        "2",
        thread_page(vec![thread(3, 2, "Follow up"), thread(4, 1, "Thanks")], false, 0),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/v1/mailbox/mailThreads/2/mailMessages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {
                    "subject": "Proposal v1",
                    "snippet": "Please find attached",
                    "add_time": "2024-01-30 08:15:00",
                    "from": [{"email_address": "ceo@example.com", "name": "CEO"}],
                    "to": [
                        {"email_address": "a@client.com", "name": "A"},
                        {"email_address": "b@client.com", "name": null}
                    ],
                    "cc": [{"email_address": null, "name": "Nobody"}],
                    "bcc": []
                },
                {"subject": "Re: Proposal v1"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/mailbox/mailThreads/3/mailMessages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = PipedriveProvider::with_base_url("token", server.uri());
    let service = HarvestService::new(Arc::new(provider), fast_settings());
    let warehouse = SqliteWarehouse::in_memory().await.unwrap();

    let written = export_threads(&service, &warehouse, &threads_table())
        .await
        .unwrap();

    // Thread 3 failed its detail fetch and is dropped.
    assert_eq!(written, 3);

    let stored = rows(
        &warehouse,
        r#"SELECT thread_id, subject, to_emails FROM "proj.crm.threads" ORDER BY thread_id"#,
    )
    .await;
    assert_eq!(
        stored,
        vec![
            (1, "Intro".to_string(), "lead1@example.com".to_string()),
            (
                2,
                "Proposal v1".to_string(),
                "a@client.com, b@client.com".to_string()
            ),
            (4, "Thanks".to_string(), "lead4@example.com".to_string()),
        ]
    );

    let enriched = rows(
        &warehouse,
        r#"SELECT message_count, from_emails, add_time
           FROM "proj.crm.threads" WHERE thread_id = 2"#,
    )
    .await;
    assert_eq!(
        enriched,
        vec![(
            3,
            "ceo@example.com".to_string(),
            "2024-01-30T08:15:00+00:00".to_string()
        )]
    );
}

#[tokio::test]
async fn thread_export_rerun_is_idempotent() {
    let server = MockServer::start().await;
    mount_thread_page(
        &server,
        "0",
        thread_page(vec![thread(1, 1, "Intro"), thread(2, 1, "Hello")], false, 0),
    )
    .await;

    let provider = PipedriveProvider::with_base_url("token", server.uri());
    let service = HarvestService::new(Arc::new(provider), fast_settings());
    let warehouse = SqliteWarehouse::in_memory().await.unwrap();

    export_threads(&service, &warehouse, &threads_table())
        .await
        .unwrap();
    export_threads(&service, &warehouse, &threads_table())
        .await
        .unwrap();

    assert_eq!(warehouse.row_count(&threads_table()).await.unwrap(), 2);
}

#[tokio::test]
async fn failed_page_keeps_previous_table() {
    let warehouse = SqliteWarehouse::in_memory().await.unwrap();

    let good = MockServer::start().await;
    mount_thread_page(&good, "0", thread_page(vec![thread(1, 1, "Intro")], false, 0)).await;
    let service = HarvestService::new(
        Arc::new(PipedriveProvider::with_base_url("token", good.uri())),
        fast_settings(),
    );
    export_threads(&service, &warehouse, &threads_table())
        .await
        .unwrap();

    let broken = MockServer::start().await;
    mount_thread_page(&broken, "0", thread_page(vec![thread(5, 1, "New")], true, 1)).await;
    Mock::given(method("GET"))
        .and(path("/v1/mailbox/mailThreads"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&broken)
        .await;
    let service = HarvestService::new(
        Arc::new(PipedriveProvider::with_base_url("token", broken.uri())),
        fast_settings(),
    );

    let result = export_threads(&service, &warehouse, &threads_table()).await;

    assert!(matches!(result, Err(ExportError::Harvest(_))));
    let stored = rows(
        &warehouse,
        r#"SELECT thread_id, subject, to_emails FROM "proj.crm.threads""#,
    )
    .await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, 1);
}

// ============================================================================
// Backlink Export Tests
// ============================================================================

#[tokio::test]
async fn backlink_export_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/site-explorer/all-backlinks"))
        .and(query_param("target", "example.com"))
        .and(header("authorization", "Bearer key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "backlinks": [
                {
                    "url_from": "https://news.site/story",
                    "url_to": "https://example.com/",
                    "anchor": "Example",
                    "domain_rating_source": 71.0,
                    "url_rating_source": 12.5,
                    "traffic_domain": 120000,
                    "refdomains_source": 900,
                    "linked_domains_source_page": 14,
                    "traffic": 30.0,
                    "positions": 8,
                    "links_external": 20,
                    "is_dofollow": true,
                    "is_nofollow": false,
                    "is_ugc": false,
                    "first_seen_link": "2024-05-10T04:00:00Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/site-explorer/all-backlinks"))
        .and(query_param("target", "broken.com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/site-explorer/refdomains"))
        .and(query_param("target", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refdomains": [
                {"domain": "news.site", "domain_rating": 71.0},
                {"domain": "big.site", "domain_rating": 92.0}
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let warehouse = SqliteWarehouse::open(dir.path().join("warehouse.db"))
        .await
        .unwrap();
    warehouse
        .db()
        .with_conn(|conn| {
            conn.execute_batch(
                r#"
                CREATE TABLE "proj.seo.domains" (domain TEXT);
                INSERT INTO "proj.seo.domains" VALUES
                    ('https://example.com/'),
                    ('broken.com');
                "#,
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let domains_table = TableId::new("proj", "seo", "domains").unwrap();
    let domains = warehouse
        .distinct_domains(&domains_table, "domain")
        .await
        .unwrap();
    assert_eq!(domains, vec!["broken.com".to_string(), "example.com".to_string()]);

    let tables = BacklinkTables {
        backlinks: TableId::new("proj", "seo", "backlinks").unwrap(),
        refdomains: TableId::new("proj", "seo", "refdomains").unwrap(),
    };
    let window = ReportWindow::ending_yesterday(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
    let service = BacklinkService::new(Arc::new(AhrefsProvider::with_base_url(
        "key",
        server.uri(),
    )));

    let summary = export_backlinks(&service, &warehouse, &domains, &window, &tables)
        .await
        .unwrap();

    assert_eq!(summary.backlinks_written, Some(1));
    assert_eq!(summary.refdomains_written, Some(1));
    assert_eq!(summary.failed_domains, vec!["broken.com".to_string()]);

    let stored = rows(
        &warehouse,
        r#"SELECT "refdomains_25+", domain, CAST("refdomains_80+" AS TEXT)
           FROM "proj.seo.refdomains""#,
    )
    .await;
    assert_eq!(stored, vec![(2, "example.com".to_string(), "1".to_string())]);

    let links = rows(
        &warehouse,
        r#"SELECT domain_traffic, domain, url_from FROM "proj.seo.backlinks""#,
    )
    .await;
    assert_eq!(
        links,
        vec![(
            120000,
            "example.com".to_string(),
            "https://news.site/story".to_string()
        )]
    );
}
