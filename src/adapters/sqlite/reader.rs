//! Read-only SQLite record source

use super::models::SqliteRecord;
use crate::adapters::database::traits::{RecordSource, SourceFailure, SourceReport};
use crate::domain::{Result, SourceError};
use rusqlite::{Connection, OpenFlags};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Streams one dataset out of a SQLite file
///
/// The connection is owned by the source and only ever used by the thread
/// that drains it.
pub struct SqliteSource<R> {
    conn: Connection,
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R: SqliteRecord> SqliteSource<R> {
    /// Opens `path` read-only and checks that the dataset query is valid
    ///
    /// # Errors
    ///
    /// Returns `SourceError::OpenFailed` if the file is missing or unreadable
    /// and `SourceError::QueryFailed` if the dataset table does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SourceError::OpenFailed(format!(
                "SQLite database not found: {}",
                path.display()
            ))
            .into());
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::OpenFailed(format!("{}: {}", path.display(), e)))?;

        conn.prepare(R::SELECT_SQL).map_err(|e| {
            SourceError::QueryFailed(format!("{} dataset: {}", R::KIND.plural(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            dataset = %R::KIND,
            "Opened SQLite source"
        );

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            _record: PhantomData,
        })
    }

    fn read_all(
        &self,
        emit: &mut dyn FnMut(R) -> bool,
    ) -> std::result::Result<SourceReport, SourceFailure> {
        let mut report = SourceReport::default();

        let query_failed = |e: rusqlite::Error| {
            SourceFailure::before_start(SourceError::QueryFailed(e.to_string()))
        };
        let mut stmt = self.conn.prepare(R::SELECT_SQL).map_err(query_failed)?;
        let mut rows = stmt.query([]).map_err(query_failed)?;

        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(
                        dataset = %R::KIND,
                        read = report.read,
                        error = %e,
                        "SQLite cursor failed"
                    );
                    return Err(SourceFailure {
                        report,
                        error: SourceError::ReadFailed(e.to_string()).into(),
                    });
                }
            };

            match R::from_row(row) {
                Ok(record) => {
                    report.read += 1;
                    if !emit(record) {
                        report.stopped_early = true;
                        break;
                    }
                }
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(
                        dataset = %R::KIND,
                        error = %e,
                        "Skipping malformed row"
                    );
                }
            }
        }

        Ok(report)
    }
}

impl<R: SqliteRecord> RecordSource<R> for SqliteSource<R> {
    fn drain(
        self: Box<Self>,
        emit: &mut dyn FnMut(R) -> bool,
    ) -> std::result::Result<SourceReport, SourceFailure> {
        self.read_all(emit)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}
