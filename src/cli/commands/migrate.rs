//! Migrate command implementation
//!
//! Opens both stores, runs the coordinator for the selected dataset and
//! turns the summary into output and an exit code.

use crate::adapters::database::traits::Destination;
use crate::adapters::postgresql::{PostgresClient, PostgresDestination, PostgresRecord};
use crate::adapters::sqlite::{SqliteRecord, SqliteSource};
use crate::config::GeoMigrateConfig;
use crate::core::migrate::{MigrationCoordinator, MigrationOptions, MigrationSummary, WorkerOutcome};
use crate::domain::{
    City, Country, DatasetKind, DestinationError, GeoMigrateError, OrphanPolicy, SourceError,
};
use crate::log_error_with_context;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Exit code for a run that completed with losses
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code for configuration and usage errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when a store cannot be reached or opened
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code for fatal migration errors
pub const EXIT_FATAL: i32 = 5;
/// Exit code after a shutdown signal (standard Unix convention)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Dataset to migrate: country or city
    #[arg(value_name = "DATASET")]
    pub dataset: DatasetKind,

    /// Override the SQLite database path
    #[arg(long, value_name = "PATH")]
    pub source: Option<String>,

    /// Override the number of insertion workers
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Override the handling of cities without a known country
    #[arg(long, value_name = "POLICY")]
    pub orphan_cities: Option<OrphanPolicy>,

    /// Insert everything, then roll back instead of committing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Maps a fatal error to the process exit code
pub fn exit_code_for(error: &GeoMigrateError) -> i32 {
    match error {
        GeoMigrateError::Configuration(_) => EXIT_CONFIG,
        GeoMigrateError::Source(SourceError::OpenFailed(_) | SourceError::QueryFailed(_))
        | GeoMigrateError::Destination(DestinationError::ConnectionFailed(_)) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// Maps a finished run to the process exit code
pub fn exit_code_for_summary(summary: &MigrationSummary) -> i32 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else if summary.is_successful() {
        0
    } else {
        EXIT_PARTIAL
    }
}

impl MigrateArgs {
    /// Applies command-line overrides on top of the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the result no longer validates.
    pub fn apply_overrides(&self, config: &mut GeoMigrateConfig) -> Result<(), GeoMigrateError> {
        if let Some(path) = &self.source {
            tracing::debug!(path = %path, "Overriding source path from CLI");
            config.source.path = path.clone();
        }

        if let Some(workers) = self.workers {
            config.migration.workers = Some(workers);
        }

        if let Some(policy) = self.orphan_cities {
            config.migration.orphan_cities = policy;
        }

        if self.dry_run {
            config.application.dry_run = true;
        }

        config.validate().map_err(|e| {
            GeoMigrateError::Configuration(format!("Configuration validation failed: {e}"))
        })
    }

    /// Execute the migrate command
    pub async fn execute(
        &self,
        config: GeoMigrateConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(dataset = %self.dataset, "Starting migrate command");

        match self.dataset {
            DatasetKind::Country => self.migrate::<Country>(&config, shutdown_signal).await,
            DatasetKind::City => self.migrate::<City>(&config, shutdown_signal).await,
        }
    }

    async fn migrate<R>(
        &self,
        config: &GeoMigrateConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32>
    where
        R: SqliteRecord + PostgresRecord,
    {
        let options = MigrationOptions::from_config(&config.migration, config.application.dry_run);

        if options.dry_run {
            tracing::info!("Dry run mode enabled - every transaction will be rolled back");
            println!("🔍 DRY RUN MODE - No data will be committed to the database");
            println!();
        }

        let source = match SqliteSource::<R>::open(&config.source.path) {
            Ok(source) => source,
            Err(e) => {
                log_error_with_context!(&e, "Failed to open SQLite source");
                eprintln!("Failed to open source: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let destination = match connect_destination(config, options.workers).await {
            Ok(destination) => destination,
            Err(e) => {
                log_error_with_context!(&e, "Failed to connect to PostgreSQL");
                eprintln!("Failed to connect to destination: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let destination: Arc<dyn Destination<R>> = Arc::new(destination);
        let coordinator = MigrationCoordinator::new(destination, options, shutdown_signal);

        let summary = match coordinator.run(Box::new(source)).await {
            Ok(summary) => summary,
            Err(e) => {
                log_error_with_context!(&e, "Migration failed");
                eprintln!("Migration failed: {e}");
                return Ok(match exit_code_for(&e) {
                    EXIT_CONFIG => EXIT_FATAL,
                    code => code,
                });
            }
        };

        summary.log_summary();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        Ok(exit_code_for_summary(&summary))
    }
}

async fn connect_destination(
    config: &GeoMigrateConfig,
    workers: usize,
) -> Result<PostgresDestination, GeoMigrateError> {
    let client = PostgresClient::new(&config.destination, workers)?;
    client.test_connection().await?;
    Ok(PostgresDestination::new(
        client,
        config.migration.orphan_cities,
    ))
}

fn print_summary(summary: &MigrationSummary) {
    println!("{}", summary.headline());
    println!();
    println!("📊 Migration Summary:");
    println!("  Dataset: {}", summary.dataset);
    println!("  Workers: {}", summary.workers);
    println!("  Records Read: {}", summary.records_read);
    println!("  Rows Skipped: {}", summary.records_skipped);
    println!("  Inserted: {}", summary.inserted);
    println!("  Failed Rows: {}", summary.failed_rows);
    if summary.rows_discarded > 0 {
        println!("  Rolled Back: {}", summary.rows_discarded);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if let Some(error) = &summary.source_error {
        println!("⚠️  Reading stopped early: {error}");
    }

    for report in &summary.worker_reports {
        if let WorkerOutcome::Failed { stage, message } = &report.outcome {
            println!(
                "⚠️  Worker {} failed at {stage} and lost {} rows: {message}",
                report.worker_id, report.inserted
            );
        }
    }

    let failures: Vec<_> = summary
        .worker_reports
        .iter()
        .flat_map(|r| r.failed.iter())
        .collect();
    if !failures.is_empty() {
        println!("⚠️  Rows not inserted:");
        for failure in failures.iter().take(10) {
            println!("  - {}: {}", failure.key, failure.message);
        }
        if failures.len() > 10 {
            println!("  ... and {} more", failures.len() - 10);
        }
    }

    if summary.interrupted {
        println!();
        println!("⚠️  Migration interrupted. Open transactions were rolled back.");
    } else if summary.is_successful() {
        println!("✅ Migration completed successfully!");
    } else {
        println!("⚠️  Migration completed with errors");
    }
}
