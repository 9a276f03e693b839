//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional
//! rotating JSON file layer.
//!
//! # Example
//!
//! ```no_run
//! use geomigrate::logging::init_logging;
//! use geomigrate::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a migration run
///
/// # Example
///
/// ```no_run
/// use geomigrate::log_migration_start;
/// use geomigrate::domain::DatasetKind;
///
/// log_migration_start!(DatasetKind::City, 8);
/// ```
#[macro_export]
macro_rules! log_migration_start {
    ($dataset:expr, $workers:expr) => {
        tracing::info!(
            dataset = %$dataset,
            workers = $workers,
            "Starting migration"
        );
    };
}

/// Log the completion of a migration run
///
/// # Example
///
/// ```no_run
/// use geomigrate::log_migration_complete;
/// use geomigrate::domain::DatasetKind;
/// use std::time::Duration;
///
/// log_migration_complete!(DatasetKind::Country, 250, Duration::from_secs(2));
/// ```
#[macro_export]
macro_rules! log_migration_complete {
    ($dataset:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            dataset = %$dataset,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Migration completed"
        );
    };
}

/// Log a worker reaching the end of its run
///
/// # Example
///
/// ```no_run
/// use geomigrate::log_worker_finished;
///
/// log_worker_finished!(3, 1200, "committed");
/// ```
#[macro_export]
macro_rules! log_worker_finished {
    ($worker_id:expr, $inserted:expr, $outcome:expr) => {
        tracing::info!(
            worker_id = $worker_id,
            inserted = $inserted,
            outcome = %$outcome,
            "Worker finished"
        );
    };
}

/// Log a single row that could not be inserted
///
/// # Example
///
/// ```no_run
/// use geomigrate::log_row_failure;
///
/// log_row_failure!(1, "Paris (FR)", "duplicate key");
/// ```
#[macro_export]
macro_rules! log_row_failure {
    ($worker_id:expr, $key:expr, $error:expr) => {
        tracing::warn!(
            worker_id = $worker_id,
            record = %$key,
            error = %$error,
            "Failed to insert record"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use geomigrate::log_error_with_context;
/// use geomigrate::domain::GeoMigrateError;
///
/// let error = GeoMigrateError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
