//! Core business logic for GeoMigrate.
//!
//! # Modules
//!
//! - [`migrate`] - Producer/worker migration pipeline and its reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use geomigrate::adapters::postgresql::{PostgresClient, PostgresDestination};
//! use geomigrate::adapters::sqlite::SqliteSource;
//! use geomigrate::config::load_config;
//! use geomigrate::core::migrate::{MigrationCoordinator, MigrationOptions};
//! use geomigrate::domain::City;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("geomigrate.toml")?;
//! let options = MigrationOptions::from_config(&config.migration, false);
//!
//! let client = PostgresClient::new(&config.destination, options.workers)?;
//! let destination = Arc::new(PostgresDestination::new(client, config.migration.orphan_cities));
//! let source = SqliteSource::<City>::open(&config.source.path)?;
//!
//! // Create shutdown signal
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = MigrationCoordinator::<City>::new(destination, options, shutdown_rx);
//! let summary = coordinator.run(Box::new(source)).await?;
//!
//! println!("{}", summary.headline());
//! # Ok(())
//! # }
//! ```

pub mod migrate;
