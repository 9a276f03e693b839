//! Domain models and types for GeoMigrate.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Records** ([`Country`], [`City`]) and the [`Record`] contract they share
//! - **Dataset selection** ([`DatasetKind`]) and the orphan-city policy ([`OrphanPolicy`])
//! - **Error types** ([`GeoMigrateError`], [`SourceError`], [`DestinationError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, GeoMigrateError>`]:
//!
//! ```rust,no_run
//! use geomigrate::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = geomigrate::config::load_config("geomigrate.toml")?;
//!     println!("{}", config.source.path);
//!     Ok(())
//! }
//! ```

pub mod city;
pub mod country;
pub mod dataset;
pub mod errors;
pub mod result;

pub use city::City;
pub use country::Country;
pub use dataset::{DatasetKind, OrphanPolicy, Record};
pub use errors::{DestinationError, GeoMigrateError, SourceError};
pub use result::Result;
