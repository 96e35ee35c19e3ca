//! Job configuration types.
//!
//! Every value is read through a lookup function (normally the process
//! environment after `.env` has been loaded), so these types can be built
//! and tested without touching global state.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;
use url::Url;

use crate::providers::backlinks::AHREFS_API_BASE;
use crate::providers::mailbox::{DEFAULT_FOLDER, DEFAULT_PAGE_SIZE, PIPEDRIVE_API_BASE};
use crate::services::{BacklinkTables, HarvestSettings};
use crate::storage::TableId;

/// Configuration errors. Each names the offending key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Typed access to a key/value source.
struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Returns the trimmed value of `key`; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> ConfigResult<String> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                message: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn base_url(&self, key: &'static str, default: &str) -> ConfigResult<Url> {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid {
                key,
                message: format!("expected an http(s) URL, got {}", raw),
            });
        }
        Ok(url)
    }

    fn table(
        &self,
        project: &'static str,
        dataset: &'static str,
        table: &'static str,
    ) -> ConfigResult<TableId> {
        TableId::new(
            self.required(project)?,
            self.required(dataset)?,
            self.required(table)?,
        )
        .map_err(|e| ConfigError::Invalid {
            key: table,
            message: e.to_string(),
        })
    }
}

/// Where the warehouse database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub path: PathBuf,
}

impl WarehouseConfig {
    /// Default location: `warehouse.db` in the platform data directory,
    /// or the working directory when none can be determined.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "harvest")
            .map(|dirs| dirs.data_dir().join("warehouse.db"))
            .unwrap_or_else(|| PathBuf::from("warehouse.db"))
    }

    /// Reads `WAREHOUSE_PATH`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };
        Self {
            path: source
                .optional("WAREHOUSE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_path),
        }
    }
}

/// Configuration of the mailbox thread export.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadExportConfig {
    pub api_token: String,
    pub base_url: Url,
    /// Mailbox folder to harvest.
    pub folder: String,
    pub page_size: u32,
    pub harvest: HarvestSettings,
    pub destination: TableId,
    pub warehouse: WarehouseConfig,
}

impl ThreadExportConfig {
    /// Builds the configuration from `lookup`.
    ///
    /// Required: `PIPEDRIVE_API_KEY`, `GOOGLE_CLOUD_PROJECT`,
    /// `BIGQUERY_DATASET`, `BIGQUERY_TABLE`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };
        let defaults = HarvestSettings::default();

        let page_size: u32 = source.parsed("HARVEST_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "HARVEST_PAGE_SIZE",
                message: "must be at least 1".to_string(),
            });
        }
        let detail_concurrency: usize =
            source.parsed("HARVEST_CONCURRENCY", defaults.detail_concurrency)?;
        if detail_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "HARVEST_CONCURRENCY",
                message: "must be at least 1".to_string(),
            });
        }

        let max_pages: u32 = source.parsed("HARVEST_MAX_PAGES", defaults.max_pages)?;
        if max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "HARVEST_MAX_PAGES",
                message: "must be at least 1".to_string(),
            });
        }

        let harvest = HarvestSettings {
            max_pages,
            detail_concurrency,
            detail_delay: Duration::from_millis(source.parsed(
                "HARVEST_DETAIL_DELAY_MS",
                defaults.detail_delay.as_millis() as u64,
            )?),
            page_delay: Duration::from_millis(source.parsed(
                "HARVEST_PAGE_DELAY_MS",
                defaults.page_delay.as_millis() as u64,
            )?),
        };

        Ok(Self {
            api_token: source.required("PIPEDRIVE_API_KEY")?,
            base_url: source.base_url("PIPEDRIVE_BASE_URL", PIPEDRIVE_API_BASE)?,
            folder: source
                .optional("PIPEDRIVE_FOLDER")
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            page_size,
            harvest,
            destination: source.table(
                "GOOGLE_CLOUD_PROJECT",
                "BIGQUERY_DATASET",
                "BIGQUERY_TABLE",
            )?,
            warehouse: WarehouseConfig::from_lookup(&source.lookup),
        })
    }
}

/// Configuration of the backlink export.
#[derive(Debug, Clone, PartialEq)]
pub struct BacklinkExportConfig {
    pub api_key: String,
    pub base_url: Url,
    /// Table listing the monitored domains.
    pub domains: TableId,
    /// Column of `domains` holding the domain names.
    pub domains_column: String,
    pub tables: BacklinkTables,
    pub warehouse: WarehouseConfig,
}

impl BacklinkExportConfig {
    /// Builds the configuration from `lookup`.
    ///
    /// Required: `AHREFS_API_KEY`, `PROJECT_ID`, `DATASET_ID`,
    /// `DOMAINS_TABLE_ID`, `BACKLINKS_TABLE_ID`, `REFDOMAINS_TABLE_ID`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        Ok(Self {
            api_key: source.required("AHREFS_API_KEY")?,
            base_url: source.base_url("AHREFS_BASE_URL", AHREFS_API_BASE)?,
            domains: source.table("PROJECT_ID", "DATASET_ID", "DOMAINS_TABLE_ID")?,
            domains_column: source
                .optional("DOMAINS_COLUMN")
                .unwrap_or_else(|| "domain".to_string()),
            tables: BacklinkTables {
                backlinks: source.table("PROJECT_ID", "DATASET_ID", "BACKLINKS_TABLE_ID")?,
                refdomains: source.table("PROJECT_ID", "DATASET_ID", "REFDOMAINS_TABLE_ID")?,
            },
            warehouse: WarehouseConfig::from_lookup(&source.lookup),
        })
    }
}
