// GeoMigrate - SQLite to PostgreSQL reference data migration
// Copyright (c) 2025 GeoMigrate Contributors
// Licensed under the MIT License

//! # GeoMigrate - SQLite to PostgreSQL reference data migration
//!
//! GeoMigrate copies geographic reference data (countries and cities) from a
//! SQLite file into PostgreSQL. Cities, the large dataset, go through a pool
//! of insertion workers fed by a single producer over a bounded relay.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Migration pipeline (relay, workers, coordinator, summary)
//! - [`adapters`] - SQLite origin and PostgreSQL destination
//! - [`domain`] - Records, dataset kinds and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Migration Model
//!
//! Every worker owns one transaction on its own pooled connection. A row that
//! fails to insert is logged and skipped without aborting the transaction.
//! Once the relay is closed and drained, each worker commits and reports how
//! many rows it inserted. A worker that cannot begin, prepare or commit loses
//! only its own rows; its siblings are unaffected.
//!
//! Countries are migrated inline in a single transaction, since cities refer
//! to them by ISO code and must be able to resolve them afterwards.
//!
//! ## Error Handling
//!
//! All fallible library operations return [`domain::Result`], an alias over
//! [`domain::GeoMigrateError`]:
//!
//! ```rust,no_run
//! use geomigrate::domain::GeoMigrateError;
//!
//! fn example() -> Result<(), GeoMigrateError> {
//!     let config = geomigrate::config::load_config("geomigrate.toml")?;
//!     println!("Migrating from {}", config.source.path);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
