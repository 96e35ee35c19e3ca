//! Configuration management.
//!
//! This module provides the settings of the two export jobs. Values come
//! from a key lookup; the binary passes the process environment after
//! loading `.env`.

mod settings;

pub use settings::{
    BacklinkExportConfig, ConfigError, ConfigResult, ThreadExportConfig, WarehouseConfig,
};
