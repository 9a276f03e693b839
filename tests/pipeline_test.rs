//! Integration tests for the concurrent city pipeline
//!
//! These tests verify that:
//! - Every record is inserted exactly once across the pool
//! - A failed row never aborts its worker's transaction
//! - A worker that cannot begin, prepare or commit leaves its siblings alone
//! - Source failures keep the rows read before them

mod common;

use common::{cities, MemoryDestination, VecSource};
use geomigrate::core::migrate::{
    FailureStage, MigrationCoordinator, MigrationOptions, WorkerOutcome,
};
use geomigrate::domain::{City, Country, OrphanPolicy};
use std::collections::HashSet;
use test_case::test_case;
use tokio::sync::watch;

fn options(workers: usize) -> MigrationOptions {
    MigrationOptions {
        workers,
        relay_capacity: workers * 2,
        dry_run: false,
    }
}

fn seeded() -> MemoryDestination {
    let destination = MemoryDestination::new();
    destination.seed_country(Country::new("Testland", "TL", "🏳", 0.0, 0.0));
    destination
}

#[test_case(1 ; "single worker")]
#[test_case(8 ; "eight workers")]
#[test_case(32 ; "more workers than threads")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_record_inserted_exactly_once(workers: usize) {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(workers), rx);

    let summary = coordinator
        .run(VecSource::new(cities(5000, "TL")).boxed())
        .await
        .unwrap();

    let per_worker: usize = summary.worker_reports.iter().map(|r| r.inserted).sum();
    assert_eq!(per_worker, 5000);
    assert_eq!(summary.inserted, 5000);
    assert_eq!(summary.records_read, 5000);
    assert_eq!(summary.worker_reports.len(), workers);
    assert!(summary.is_successful());

    let stored = destination.cities();
    let names: HashSet<_> = stored.iter().map(|(c, _)| c.name.clone()).collect();
    assert_eq!(stored.len(), 5000);
    assert_eq!(names.len(), 5000);
    assert_eq!(destination.commits(), workers);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mapping_is_preserved() {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(2), rx);

    let city = City::new("Testville", "TL", 48.8566, 2.3522);
    coordinator
        .run(VecSource::new(vec![city.clone()]).boxed())
        .await
        .unwrap();

    let stored = destination.cities();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, city);
    assert_eq!(stored[0].1, Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_row_failure_is_isolated() {
    let destination = seeded().failing_key("City 7 (TL)");
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(3), rx);

    let summary = coordinator
        .run(VecSource::new(cities(20, "TL")).boxed())
        .await
        .unwrap();

    assert_eq!(summary.inserted, 19);
    assert_eq!(summary.failed_rows, 1);
    assert!(summary
        .worker_reports
        .iter()
        .all(|r| r.outcome == WorkerOutcome::Committed));
    assert!(!summary.is_successful());

    let failure = summary
        .worker_reports
        .iter()
        .flat_map(|r| r.failed.iter())
        .next()
        .unwrap();
    assert_eq!(failure.key, "City 7 (TL)");
    assert_eq!(destination.cities().len(), 19);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_begin_failure_does_not_affect_siblings() {
    let destination = seeded().failing_begins(1);
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(4), rx);

    let summary = coordinator
        .run(VecSource::new(cities(100, "TL")).boxed())
        .await
        .unwrap();

    assert_eq!(summary.failed_workers(), 1);
    assert_eq!(summary.inserted, 100);
    assert_eq!(destination.cities().len(), 100);

    let failed = summary
        .worker_reports
        .iter()
        .find(|r| r.is_failed())
        .unwrap();
    assert_eq!(failed.inserted, 0);
    assert!(matches!(
        failed.outcome,
        WorkerOutcome::Failed {
            stage: FailureStage::Begin,
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_prepare_failure_rolls_back_that_worker() {
    let destination = seeded().failing_prepares(1);
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(3), rx);

    let summary = coordinator
        .run(VecSource::new(cities(60, "TL")).boxed())
        .await
        .unwrap();

    assert_eq!(summary.failed_workers(), 1);
    assert_eq!(summary.inserted, 60);
    assert_eq!(destination.rollbacks(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_commit_failure_loses_only_that_workers_rows() {
    let destination = seeded().failing_commits(1);
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(2), rx);

    let summary = coordinator
        .run(VecSource::new(cities(200, "TL")).boxed())
        .await
        .unwrap();

    let failed = summary
        .worker_reports
        .iter()
        .find(|r| r.is_failed())
        .unwrap();
    assert!(matches!(
        failed.outcome,
        WorkerOutcome::Failed {
            stage: FailureStage::Commit,
            ..
        }
    ));

    assert_eq!(summary.inserted + summary.rows_discarded, 200);
    assert_eq!(summary.rows_discarded, failed.inserted);
    assert_eq!(destination.cities().len(), summary.inserted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_worker_failing_still_completes() {
    let destination = seeded().failing_begins(4);
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(4), rx);

    let summary = coordinator
        .run(VecSource::new(cities(1000, "TL")).boxed())
        .await
        .unwrap();

    assert_eq!(summary.failed_workers(), 4);
    assert_eq!(summary.inserted, 0);
    assert!(destination.cities().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_source_failure_keeps_rows_read_before_it() {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(2), rx);

    let summary = coordinator
        .run(VecSource::new(cities(10, "TL")).failing_after(3).boxed())
        .await
        .unwrap();

    assert!(summary.source_error.is_some());
    assert_eq!(summary.records_read, 3);
    assert_eq!(summary.inserted, 3);
    assert!(!summary.is_successful());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_source_failure_keeps_skip_count() {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(2), rx);

    let summary = coordinator
        .run(
            VecSource::new(cities(10, "TL"))
                .with_skipped(2)
                .failing_after(4)
                .boxed(),
        )
        .await
        .unwrap();

    assert!(summary.source_error.is_some());
    assert_eq!(summary.records_read, 4);
    assert_eq!(summary.records_skipped, 2);
    assert_eq!(summary.inserted, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sequential_source_failure_keeps_skip_count() {
    let destination = MemoryDestination::new();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<Country>::new(destination.shared(), options(1), rx);
    let countries = vec![
        Country::new("Testland", "TL", "🏳", 0.0, 0.0),
        Country::new("Otherland", "OL", "🏴", 0.0, 0.0),
        Country::new("Lostland", "LL", "🏁", 0.0, 0.0),
    ];

    let summary = coordinator
        .run(
            VecSource::new(countries)
                .with_skipped(1)
                .failing_after(2)
                .boxed(),
        )
        .await
        .unwrap();

    assert!(summary.source_error.is_some());
    assert_eq!(summary.records_read, 2);
    assert_eq!(summary.records_skipped, 1);
    assert_eq!(destination.countries().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_skipped_rows_are_reported() {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(2), rx);

    let summary = coordinator
        .run(VecSource::new(cities(5, "TL")).with_skipped(2).boxed())
        .await
        .unwrap();

    assert_eq!(summary.records_skipped, 2);
    assert_eq!(summary.inserted, 5);
    assert!(!summary.is_successful());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_rows() {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);
    let coordinator = MigrationCoordinator::<City>::new(destination.shared(), options(4), rx);

    let summary = coordinator.run(VecSource::new(Vec::new()).boxed()).await.unwrap();

    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.failed_rows, 0);
    assert!(summary.is_successful());
    assert_eq!(
        summary.headline(),
        "Migrated 0 cities from SQLite to PostgreSQL"
    );
    assert!(destination.cities().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_orphan_city_policies() {
    let destination = seeded();
    let (_tx, rx) = watch::channel(false);

    let records = vec![
        City::new("Testville", "TL", 1.0, 1.0),
        City::new("Nowhere", "ZZ", 2.0, 2.0),
    ];

    let lenient = MigrationCoordinator::<City>::new(
        destination.sharing_with(OrphanPolicy::InsertNull).shared(),
        options(2),
        rx.clone(),
    );
    let summary = lenient.run(VecSource::new(records.clone()).boxed()).await.unwrap();
    assert_eq!(summary.inserted, 2);

    let orphan = destination
        .cities()
        .into_iter()
        .find(|(c, _)| c.name == "Nowhere")
        .unwrap();
    assert_eq!(orphan.1, None);

    let strict = MigrationCoordinator::<City>::new(
        destination.sharing_with(OrphanPolicy::Reject).shared(),
        options(2),
        rx,
    );
    let summary = strict.run(VecSource::new(records).boxed()).await.unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.failed_rows, 1);

    let failure = summary
        .worker_reports
        .iter()
        .flat_map(|r| r.failed.iter())
        .next()
        .unwrap();
    assert_eq!(failure.key, "Nowhere (ZZ)");
    assert!(failure.message.contains("No country with iso_code 'ZZ'"));
}
