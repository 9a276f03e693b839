//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for GeoMigrate using clap.

pub mod commands;

use clap::Parser;

/// GeoMigrate - SQLite to PostgreSQL reference data migration
#[derive(Parser, Debug)]
#[command(name = "geomigrate")]
#[command(version, about, long_about = None)]
#[command(author = "GeoMigrate Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to ./geomigrate.toml when present)
    #[arg(short, long, env = "GEOMIGRATE_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "GEOMIGRATE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Migration to run
    #[command(flatten)]
    pub migrate: commands::migrate::MigrateArgs,
}
