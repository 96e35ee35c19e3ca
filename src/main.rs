//! harvest - Entry point for the export jobs

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use harvest::config::{BacklinkExportConfig, ThreadExportConfig};
use harvest::domain::ReportWindow;
use harvest::providers::backlinks::AhrefsProvider;
use harvest::providers::mailbox::PipedriveProvider;
use harvest::services::{export_backlinks, export_threads, BacklinkService, HarvestService};
use harvest::storage::SqliteWarehouse;

#[derive(Parser)]
#[command(name = "harvest", version, about = "Export CRM mail threads and backlink data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest every sent mailbox thread and replace the threads table
    Threads,
    /// Collect last week's backlinks for the monitored domains
    Backlinks,
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

async fn run_threads() -> anyhow::Result<()> {
    let config = ThreadExportConfig::from_lookup(env_lookup)
        .context("failed to load thread export configuration")?;

    let provider =
        PipedriveProvider::with_base_url(config.api_token.clone(), config.base_url.as_str())
            .with_folder(config.folder.clone())
            .with_page_size(config.page_size);
    let service = HarvestService::new(Arc::new(provider), config.harvest.clone());

    let warehouse = SqliteWarehouse::open(&config.warehouse.path)
        .await
        .with_context(|| {
            format!(
                "failed to open warehouse at {}",
                config.warehouse.path.display()
            )
        })?;

    let written = export_threads(&service, &warehouse, &config.destination).await?;
    tracing::info!(rows = written, table = %config.destination, "Thread export finished");
    Ok(())
}

async fn run_backlinks() -> anyhow::Result<()> {
    let config = BacklinkExportConfig::from_lookup(env_lookup)
        .context("failed to load backlink export configuration")?;

    let warehouse = SqliteWarehouse::open(&config.warehouse.path)
        .await
        .with_context(|| {
            format!(
                "failed to open warehouse at {}",
                config.warehouse.path.display()
            )
        })?;

    let domains = warehouse
        .distinct_domains(&config.domains, &config.domains_column)
        .await
        .with_context(|| format!("failed to read monitored domains from {}", config.domains))?;
    if domains.is_empty() {
        tracing::warn!(table = %config.domains, "No monitored domains found");
        return Ok(());
    }

    let window = ReportWindow::ending_yesterday(chrono::Utc::now().date_naive());
    tracing::info!(
        start = %window.start_iso(),
        end = %window.end_iso(),
        domains = domains.len(),
        "Collecting backlinks"
    );

    let provider =
        AhrefsProvider::with_base_url(config.api_key.clone(), config.base_url.as_str());
    let service = BacklinkService::new(Arc::new(provider));
    let summary =
        export_backlinks(&service, &warehouse, &domains, &window, &config.tables).await?;

    tracing::info!(
        backlinks = summary.backlinks_written.unwrap_or(0),
        refdomains = summary.refdomains_written.unwrap_or(0),
        failed_domains = summary.failed_domains.len(),
        "Backlink export finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env before the filter so RUST_LOG can come from it
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Threads => run_threads().await,
        Command::Backlinks => run_backlinks().await,
    };

    if let Err(e) = result {
        tracing::error!("Export failed: {:#}", e);
        std::process::exit(1);
    }
}
