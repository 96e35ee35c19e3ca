//! Warehouse storage.
//!
//! This module provides the write side of the jobs:
//!
//! - [`RecordSink`], the full-replace destination contract
//! - [`SqliteWarehouse`], a SQLite-backed warehouse implementing it
//! - Async-safe database operations via tokio::task::spawn_blocking

mod database;
mod rows;
mod sink;
mod warehouse;

pub use database::{Database, DatabaseError};
pub use sink::{
    Column, ColumnType, RecordSink, Result, SinkError, TableData, TableId, TableRow,
};
pub use warehouse::SqliteWarehouse;
