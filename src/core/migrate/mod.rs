//! Migration pipeline
//!
//! - [`relay`] - Bounded queue between the producer and the workers
//! - [`worker`] - Insertion worker owning one destination transaction
//! - [`coordinator`] - Launches producer and workers, waits, aggregates
//! - [`summary`] - Typed worker outcomes and the run summary

pub mod coordinator;
pub mod relay;
pub mod summary;
pub mod worker;

pub use coordinator::{MigrationCoordinator, MigrationOptions};
pub use relay::{Relay, RelaySender};
pub use summary::{FailureStage, MigrationSummary, RecordFailure, WorkerOutcome, WorkerReport};
pub use worker::Worker;
