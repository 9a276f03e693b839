//! Store abstraction traits
//!
//! The migration pipeline only talks to these traits. The SQLite origin and
//! the PostgreSQL destination implement them, and tests substitute in-memory
//! doubles.

use crate::domain::{GeoMigrateError, Record, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Counts reported by a source once it stops producing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    /// Records decoded and handed to the consumer
    pub read: usize,

    /// Rows skipped because they could not be decoded
    pub skipped: usize,

    /// The consumer refused a record, so reading stopped before exhaustion
    pub stopped_early: bool,
}

/// A source that stopped on an error, with the counts reached before it
#[derive(Debug)]
pub struct SourceFailure {
    /// Counts up to the failure
    pub report: SourceReport,

    /// What stopped the source
    pub error: GeoMigrateError,
}

impl SourceFailure {
    /// Failure before any row was looked at
    pub fn before_start(error: impl Into<GeoMigrateError>) -> Self {
        Self {
            report: SourceReport::default(),
            error: error.into(),
        }
    }
}

/// A lazy, finite, non-restartable sequence of records
///
/// Reading is synchronous and is expected to run on a blocking thread.
pub trait RecordSource<R: Record>: Send {
    /// Reads every remaining record and hands it to `emit`
    ///
    /// Reading stops early when `emit` returns `false`. Malformed rows are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceFailure`] if the underlying cursor fails. Records
    /// emitted before the failure stay emitted and stay counted, as do the
    /// rows skipped until then.
    fn drain(
        self: Box<Self>,
        emit: &mut dyn FnMut(R) -> bool,
    ) -> std::result::Result<SourceReport, SourceFailure>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

/// Destination store that hands out transactional insert sessions
#[async_trait]
pub trait Destination<R: Record>: Send + Sync {
    /// Opens a new transaction on a dedicated connection
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or `BEGIN` fails.
    async fn begin(&self) -> Result<Box<dyn InsertSession<R>>>;

    /// Short description for log lines, without credentials
    fn describe(&self) -> String;
}

/// One open transaction owned by a single worker
///
/// A session that is dropped without `commit` or `rollback` must leave
/// nothing behind in the destination.
#[async_trait]
pub trait InsertSession<R: Record>: Send {
    /// Prepares the insert statement reused for every record
    async fn prepare(&mut self) -> Result<()>;

    /// Inserts one record
    ///
    /// A failed insert leaves the session usable for the next record.
    async fn insert(&mut self, record: &R) -> Result<()>;

    /// Commits every successful insert of this session
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every insert of this session
    async fn rollback(self: Box<Self>) -> Result<()>;
}
