//! Configuration management for GeoMigrate.
//!
//! # Overview
//!
//! GeoMigrate reads an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `GEOMIGRATE_*` overrides and the `DB_URL` shorthand
//! - Validation before any database is touched
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use geomigrate::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("geomigrate.toml")?;
//!
//! println!("SQLite source: {}", config.source.path);
//! println!("Workers: {}", config.migration.worker_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run switch
//! - [`SourceConfig`] - SQLite file location
//! - [`DestinationConfig`] - PostgreSQL connection and pool settings
//! - [`MigrationConfig`] - Worker pool and relay sizing, orphan-city policy
//! - [`LoggingConfig`] - Optional JSON file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [source]
//! path = "./db.sqlite3"
//!
//! [destination]
//! connection_string = "${DB_URL}"
//! ssl_mode = "prefer"
//!
//! [migration]
//! worker_multiplier = 2
//! orphan_cities = "insert_null"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_from_env, resolve_config, DEFAULT_CONFIG_FILE};
pub use schema::{
    ApplicationConfig, DestinationConfig, GeoMigrateConfig, LoggingConfig, MigrationConfig,
    SourceConfig,
};
pub use secret::{redact_connection_string, secret_string, SecretString, SecretValue};
