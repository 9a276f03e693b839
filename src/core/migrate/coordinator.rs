//! Migration coordinator - orchestrates one run for one dataset
//!
//! Cities go through the concurrent path: N workers on a shared relay fed by
//! one producer on the blocking pool. Countries take the sequential path: the
//! whole dataset is buffered in memory, then inserted in a single
//! transaction. That keeps the SQLite read off the async runtime and is only
//! suitable for small datasets.

use super::relay::{self, RelaySender};
use super::summary::{FailureStage, MigrationSummary, WorkerOutcome, WorkerReport};
use super::worker::{insert_record, Worker};
use crate::adapters::database::traits::{
    Destination, RecordSource, SourceFailure, SourceReport,
};
use crate::config::schema::MigrationConfig;
use crate::domain::{DatasetKind, Record, Result, SourceError};
use crate::{log_migration_complete, log_migration_start};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Sizing and behaviour of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Worker count for the concurrent path
    pub workers: usize,

    /// Relay capacity for the concurrent path
    pub relay_capacity: usize,

    /// Roll back instead of committing
    pub dry_run: bool,
}

impl MigrationOptions {
    /// Derives the options from configuration
    pub fn from_config(config: &MigrationConfig, dry_run: bool) -> Self {
        let workers = config.worker_count();
        Self {
            workers,
            relay_capacity: config.relay_capacity(workers),
            dry_run,
        }
    }
}

/// What the producer left behind
struct ProducerOutcome {
    report: SourceReport,
    error: Option<String>,
}

impl From<std::result::Result<SourceReport, SourceFailure>> for ProducerOutcome {
    fn from(result: std::result::Result<SourceReport, SourceFailure>) -> Self {
        match result {
            Ok(report) => Self {
                report,
                error: None,
            },
            Err(SourceFailure { report, error }) => Self {
                report,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Drains `source` into `sender`, then closes the relay
///
/// Runs on a blocking thread. Stops early on shutdown or once every worker
/// has gone away.
fn produce<R: Record>(
    source: Box<dyn RecordSource<R>>,
    sender: RelaySender<R>,
    shutdown: watch::Receiver<bool>,
) -> ProducerOutcome {
    let result = source.drain(&mut |record| {
        if *shutdown.borrow() {
            return false;
        }
        match sender.blocking_push(record) {
            Ok(()) => true,
            Err(record) => {
                tracing::warn!(record = %record.key(), "No worker left to take records");
                false
            }
        }
    });
    sender.close();

    result.into()
}

/// Migration coordinator
pub struct MigrationCoordinator<R: Record> {
    destination: Arc<dyn Destination<R>>,
    options: MigrationOptions,
    shutdown: watch::Receiver<bool>,
}

impl<R: Record> MigrationCoordinator<R> {
    /// Create a new migration coordinator
    pub fn new(
        destination: Arc<dyn Destination<R>>,
        options: MigrationOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            destination,
            options,
            shutdown,
        }
    }

    /// Runs the migration on the path suited to the dataset
    pub async fn run(&self, source: Box<dyn RecordSource<R>>) -> Result<MigrationSummary> {
        match R::KIND {
            DatasetKind::Country => self.run_sequential(source).await,
            DatasetKind::City => self.run_concurrent(source).await,
        }
    }

    /// Runs the producer and the worker pool
    ///
    /// Individual workers may fail; the run itself only fails if it cannot
    /// be started at all, which never happens here. Every failure is reported
    /// in the summary.
    pub async fn run_concurrent(
        &self,
        source: Box<dyn RecordSource<R>>,
    ) -> Result<MigrationSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = self.options.workers.max(1);

        log_migration_start!(R::KIND, workers);
        tracing::debug!(
            source = %source.describe(),
            destination = %self.destination.describe(),
            relay_capacity = self.options.relay_capacity,
            "Launching worker pool"
        );

        let (sender, relay) = relay::channel::<R>(self.options.relay_capacity);

        let handles: Vec<_> = (1..=workers)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    Arc::clone(&self.destination),
                    relay.clone(),
                    self.shutdown.clone(),
                    self.options.dry_run,
                );
                tokio::spawn(worker.run())
            })
            .collect();
        drop(relay);

        let shutdown = self.shutdown.clone();
        let producer = tokio::task::spawn_blocking(move || produce(source, sender, shutdown));

        let worker_reports: Vec<WorkerReport> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(idx, joined)| {
                joined.unwrap_or_else(|e| {
                    tracing::error!(worker_id = idx + 1, error = %e, "Worker task failed");
                    WorkerReport::failed(idx + 1, FailureStage::Task, e.to_string())
                })
            })
            .collect();

        let produced = producer.await.unwrap_or_else(|e| ProducerOutcome {
            report: SourceReport::default(),
            error: Some(SourceError::ReaderTask(e.to_string()).to_string()),
        });

        let summary = MigrationSummary::from_reports(
            R::KIND,
            workers,
            produced.report,
            produced.error,
            worker_reports,
            *self.shutdown.borrow(),
            self.options.dry_run,
            started_at,
            start.elapsed(),
        );

        log_migration_complete!(R::KIND, summary.inserted, summary.duration);
        Ok(summary)
    }

    /// Runs everything inline in one transaction
    ///
    /// Every record is read into memory before `BEGIN`, so the transaction is
    /// only held open for the inserts.
    ///
    /// # Errors
    ///
    /// Failing to begin, prepare or commit aborts the run, as does losing the
    /// destination session mid-way.
    pub async fn run_sequential(
        &self,
        source: Box<dyn RecordSource<R>>,
    ) -> Result<MigrationSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        log_migration_start!(R::KIND, 1);

        let shutdown = self.shutdown.clone();
        let (records, produced) = tokio::task::spawn_blocking(move || {
            let mut records = Vec::new();
            let result = source.drain(&mut |record| {
                if *shutdown.borrow() {
                    return false;
                }
                records.push(record);
                true
            });
            (records, ProducerOutcome::from(result))
        })
        .await
        .map_err(|e| SourceError::ReaderTask(e.to_string()))?;

        let mut report = WorkerReport::new(0);
        let mut session = self.destination.begin().await?;

        if let Err(e) = session.prepare().await {
            if let Err(rollback) = session.rollback().await {
                tracing::warn!(error = %rollback, "Rollback failed");
            }
            return Err(e);
        }

        let mut interrupted = *self.shutdown.borrow();
        for record in &records {
            if interrupted || *self.shutdown.borrow() {
                interrupted = true;
                break;
            }
            if let Err(e) = insert_record(session.as_mut(), record, &mut report).await {
                if let Err(rollback) = session.rollback().await {
                    tracing::warn!(error = %rollback, "Rollback failed");
                }
                return Err(e);
            }
        }

        if interrupted || self.options.dry_run {
            session.rollback().await?;
            report.outcome = if interrupted {
                tracing::warn!(discarded = report.inserted, "Shutdown requested, rolled back");
                WorkerOutcome::Interrupted
            } else {
                WorkerOutcome::RolledBack
            };
        } else {
            session.commit().await?;
            report.outcome = WorkerOutcome::Committed;
        }

        let summary = MigrationSummary::from_reports(
            R::KIND,
            1,
            produced.report,
            produced.error,
            vec![report],
            interrupted,
            self.options.dry_run,
            started_at,
            start.elapsed(),
        );

        log_migration_complete!(R::KIND, summary.inserted, summary.duration);
        Ok(summary)
    }
}
