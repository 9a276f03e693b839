//! Domain error types
//!
//! This module defines the error hierarchy for GeoMigrate.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main GeoMigrate error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum GeoMigrateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Origin store errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Destination store errors
    #[error("Destination error: {0}")]
    Destination(#[from] DestinationError),
}

/// Origin store errors
///
/// Errors that occur while reading records from the SQLite origin.
/// These errors don't expose the SQLite driver types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The origin database could not be opened
    #[error("Failed to open origin database: {0}")]
    OpenFailed(String),

    /// The dataset query could not be prepared or started
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The cursor failed while stepping through rows
    #[error("Failed to read row: {0}")]
    ReadFailed(String),

    /// The blocking reader task panicked or was cancelled
    #[error("Reader task failed: {0}")]
    ReaderTask(String),
}

/// Destination store errors
///
/// Errors that occur when writing to PostgreSQL.
/// These errors don't expose the PostgreSQL driver types.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// Failed to connect or obtain a pooled connection
    #[error("Failed to connect to destination: {0}")]
    ConnectionFailed(String),

    /// Failed to begin a transaction
    #[error("Failed to begin transaction: {0}")]
    TransactionFailed(String),

    /// Failed to prepare the insert statement
    #[error("Failed to prepare statement: {0}")]
    PrepareFailed(String),

    /// A single record could not be inserted
    #[error("Insert failed: {0}")]
    InsertFailed(String),

    /// The parent country of a record does not exist in the destination
    #[error("No country with iso_code '{0}' in destination")]
    MissingParent(String),

    /// Failed to commit the transaction
    #[error("Failed to commit transaction: {0}")]
    CommitFailed(String),

    /// Failed to roll back the transaction
    #[error("Failed to roll back transaction: {0}")]
    RollbackFailed(String),
}

impl DestinationError {
    /// Whether this error only affects the record being inserted
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            DestinationError::InsertFailed(_) | DestinationError::MissingParent(_)
        )
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for GeoMigrateError {
    fn from(err: toml::de::Error) -> Self {
        GeoMigrateError::Configuration(format!("TOML parse error: {err}"))
    }
}
