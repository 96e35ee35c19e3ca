//! harvest - CRM mailbox and backlink exports into a local warehouse
//!
//! This crate provides the core functionality of the `harvest` jobs,
//! including the provider API clients, the harvest services, and the
//! replace-write warehouse storage.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;
