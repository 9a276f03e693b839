//! Insertion worker
//!
//! A worker owns one destination session for its whole life. It drains the
//! relay into that session and commits once the relay is closed and empty.

use super::relay::Relay;
use super::summary::{FailureStage, WorkerOutcome, WorkerReport};
use crate::adapters::database::traits::{Destination, InsertSession};
use crate::domain::{GeoMigrateError, Record};
use crate::{log_row_failure, log_worker_finished};
use std::sync::Arc;
use tokio::sync::watch;

/// Resolves once shutdown has been requested
///
/// Never resolves if the signal sender is gone without having fired.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let fired = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !fired {
        std::future::pending::<()>().await;
    }
}

/// Whether an insert error only affects the record being inserted
pub(crate) fn is_row_level(error: &GeoMigrateError) -> bool {
    matches!(error, GeoMigrateError::Destination(e) if e.is_row_level())
}

/// Inserts one record, recording a row-level failure in `report`
///
/// Returns the error when it is not row-level, meaning the session itself is
/// no longer usable.
pub(crate) async fn insert_record<R: Record>(
    session: &mut dyn InsertSession<R>,
    record: &R,
    report: &mut WorkerReport,
) -> Result<(), GeoMigrateError> {
    match session.insert(record).await {
        Ok(()) => {
            report.inserted += 1;
            Ok(())
        }
        Err(e) if is_row_level(&e) => {
            let key = record.key();
            log_row_failure!(report.worker_id, key, e);
            report.add_failure(key, e.to_string());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

enum Next<R> {
    Record(R),
    Drained,
    Interrupted,
}

/// One member of the worker pool
pub struct Worker<R: Record> {
    id: usize,
    destination: Arc<dyn Destination<R>>,
    relay: Relay<R>,
    shutdown: watch::Receiver<bool>,
    dry_run: bool,
}

impl<R: Record> Worker<R> {
    /// Create a new worker
    pub fn new(
        id: usize,
        destination: Arc<dyn Destination<R>>,
        relay: Relay<R>,
        shutdown: watch::Receiver<bool>,
        dry_run: bool,
    ) -> Self {
        Self {
            id,
            destination,
            relay,
            shutdown,
            dry_run,
        }
    }

    /// Runs the worker to completion
    ///
    /// Never fails: every problem ends up in the returned report, and errors
    /// never reach sibling workers.
    pub async fn run(mut self) -> WorkerReport {
        let mut report = WorkerReport::new(self.id);

        let mut session = match self.destination.begin().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(worker_id = self.id, error = %e, "Failed to begin transaction");
                report.fail(FailureStage::Begin, e.to_string());
                return report;
            }
        };

        if let Err(e) = session.prepare().await {
            tracing::error!(worker_id = self.id, error = %e, "Failed to prepare insert statement");
            report.fail(FailureStage::Prepare, e.to_string());
            self.discard(session).await;
            return report;
        }

        let ended = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => Next::Interrupted,
                record = self.relay.pop() => match record {
                    Some(record) => Next::Record(record),
                    None => Next::Drained,
                },
            };

            match next {
                Next::Record(record) => {
                    if let Err(e) = insert_record(session.as_mut(), &record, &mut report).await {
                        tracing::error!(
                            worker_id = self.id,
                            record = %record.key(),
                            error = %e,
                            "Destination session lost"
                        );
                        report.fail(FailureStage::Insert, e.to_string());
                        break Next::<R>::Drained;
                    }
                }
                other => break other,
            }
        };

        if report.is_failed() {
            self.discard(session).await;
        } else if matches!(ended, Next::Interrupted) {
            tracing::warn!(
                worker_id = self.id,
                discarded = report.inserted,
                "Shutdown requested, rolling back"
            );
            self.discard(session).await;
            report.outcome = WorkerOutcome::Interrupted;
        } else if self.dry_run {
            self.discard(session).await;
            report.outcome = WorkerOutcome::RolledBack;
        } else {
            match session.commit().await {
                Ok(()) => report.outcome = WorkerOutcome::Committed,
                Err(e) => {
                    tracing::error!(
                        worker_id = self.id,
                        discarded = report.inserted,
                        error = %e,
                        "Failed to commit transaction"
                    );
                    report.fail(FailureStage::Commit, e.to_string());
                }
            }
        }

        log_worker_finished!(self.id, report.committed(), report.outcome);
        report
    }

    async fn discard(&self, session: Box<dyn InsertSession<R>>) {
        if let Err(e) = session.rollback().await {
            tracing::warn!(worker_id = self.id, error = %e, "Rollback failed");
        }
    }
}
