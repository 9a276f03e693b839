//! Migration summary and reporting
//!
//! Workers report typed outcomes; the coordinator folds them, together with
//! the source report, into one [`MigrationSummary`].

use crate::adapters::database::traits::SourceReport;
use crate::domain::DatasetKind;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// A record that could not be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Natural key of the record
    pub key: String,

    /// Error message
    pub message: String,
}

/// Stage at which a worker gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Opening the transaction
    Begin,
    /// Preparing the insert statement
    Prepare,
    /// Connection-level failure while inserting
    Insert,
    /// Committing the transaction
    Commit,
    /// The worker task itself panicked
    Task,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            FailureStage::Begin => "begin",
            FailureStage::Prepare => "prepare",
            FailureStage::Insert => "insert",
            FailureStage::Commit => "commit",
            FailureStage::Task => "task",
        };
        f.write_str(stage)
    }
}

/// How a worker's transaction ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerOutcome {
    /// Every successful insert is durable
    Committed,
    /// Dry run, the transaction was rolled back on purpose
    RolledBack,
    /// Shutdown was requested, the transaction was rolled back
    Interrupted,
    /// The worker stopped early and its partial work is lost
    Failed {
        /// Where it failed
        stage: FailureStage,
        /// Error message
        message: String,
    },
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerOutcome::Committed => f.write_str("committed"),
            WorkerOutcome::RolledBack => f.write_str("rolled back"),
            WorkerOutcome::Interrupted => f.write_str("interrupted"),
            WorkerOutcome::Failed { stage, .. } => write!(f, "failed at {stage}"),
        }
    }
}

/// What one worker did during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// Worker number, starting at 1 (0 for the sequential path)
    pub worker_id: usize,

    /// Records inserted inside the worker's transaction
    pub inserted: usize,

    /// Records whose insert failed
    pub failed: Vec<RecordFailure>,

    /// Transaction outcome
    pub outcome: WorkerOutcome,
}

impl WorkerReport {
    /// Report for a worker that has not finished yet
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            inserted: 0,
            failed: Vec::new(),
            outcome: WorkerOutcome::Committed,
        }
    }

    /// Report for a worker that ended with `stage` failing
    pub fn failed(worker_id: usize, stage: FailureStage, message: impl Into<String>) -> Self {
        let mut report = Self::new(worker_id);
        report.fail(stage, message);
        report
    }

    /// Marks the worker as failed at `stage`
    pub fn fail(&mut self, stage: FailureStage, message: impl Into<String>) {
        self.outcome = WorkerOutcome::Failed {
            stage,
            message: message.into(),
        };
    }

    /// Records a row-level failure
    pub fn add_failure(&mut self, key: String, message: String) {
        self.failed.push(RecordFailure { key, message });
    }

    /// Rows that are durable in the destination
    pub fn committed(&self) -> usize {
        match self.outcome {
            WorkerOutcome::Committed => self.inserted,
            _ => 0,
        }
    }

    /// Rows inserted but then discarded with the transaction
    pub fn discarded(&self) -> usize {
        self.inserted - self.committed()
    }

    /// Whether the worker stopped on an error
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, WorkerOutcome::Failed { .. })
    }
}

/// Summary of one migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    /// Dataset that was migrated
    pub dataset: DatasetKind,

    /// Number of workers, 1 for the sequential path
    pub workers: usize,

    /// Records read from the origin
    pub records_read: usize,

    /// Origin rows skipped because they could not be decoded
    pub records_skipped: usize,

    /// Records durable in the destination
    pub inserted: usize,

    /// Records whose insert failed
    pub failed_rows: usize,

    /// Records inserted but discarded by a rollback
    pub rows_discarded: usize,

    /// Per-worker detail
    pub worker_reports: Vec<WorkerReport>,

    /// Error that ended reading early, if any
    pub source_error: Option<String>,

    /// Shutdown was requested during the run
    pub interrupted: bool,

    /// Run was a dry run
    pub dry_run: bool,

    /// Start of the run
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl MigrationSummary {
    /// Folds worker reports and the source outcome into a summary
    #[allow(clippy::too_many_arguments)]
    pub fn from_reports(
        dataset: DatasetKind,
        workers: usize,
        source: SourceReport,
        source_error: Option<String>,
        worker_reports: Vec<WorkerReport>,
        interrupted: bool,
        dry_run: bool,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        let inserted = worker_reports.iter().map(WorkerReport::committed).sum();
        let failed_rows = worker_reports.iter().map(|r| r.failed.len()).sum();
        let rows_discarded = worker_reports.iter().map(WorkerReport::discarded).sum();
        let interrupted = interrupted
            || worker_reports
                .iter()
                .any(|r| r.outcome == WorkerOutcome::Interrupted);

        Self {
            dataset,
            workers,
            records_read: source.read,
            records_skipped: source.skipped,
            inserted,
            failed_rows,
            rows_discarded,
            worker_reports,
            source_error,
            interrupted,
            dry_run,
            started_at,
            duration,
        }
    }

    /// Number of workers that stopped on an error
    pub fn failed_workers(&self) -> usize {
        self.worker_reports.iter().filter(|r| r.is_failed()).count()
    }

    /// Check if the run completed without any loss
    pub fn is_successful(&self) -> bool {
        !self.interrupted
            && self.source_error.is_none()
            && self.records_skipped == 0
            && self.failed_rows == 0
            && self.failed_workers() == 0
    }

    /// Human-readable result line
    pub fn headline(&self) -> String {
        if self.dry_run {
            format!(
                "Dry run: {} {} would be migrated from SQLite to PostgreSQL (rolled back)",
                self.rows_discarded,
                self.dataset.plural()
            )
        } else {
            format!(
                "Migrated {} {} from SQLite to PostgreSQL",
                self.inserted,
                self.dataset.plural()
            )
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            dataset = %self.dataset,
            workers = self.workers,
            records_read = self.records_read,
            records_skipped = self.records_skipped,
            inserted = self.inserted,
            failed_rows = self.failed_rows,
            rows_discarded = self.rows_discarded,
            duration_ms = self.duration.as_millis() as u64,
            dry_run = self.dry_run,
            "Migration summary"
        );

        if let Some(error) = &self.source_error {
            tracing::warn!(error = %error, "Reading stopped on a source error");
        }

        for report in self.worker_reports.iter().filter(|r| r.is_failed()) {
            if let WorkerOutcome::Failed { stage, message } = &report.outcome {
                tracing::warn!(
                    worker_id = report.worker_id,
                    stage = %stage,
                    error = %message,
                    discarded = report.inserted,
                    "Worker lost its transaction"
                );
            }
        }
    }
}
