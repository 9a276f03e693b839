//! Shared test doubles
//!
//! `MemoryDestination` behaves like the PostgreSQL destination as far as the
//! pipeline can tell: each session stages its rows privately and only a
//! commit makes them visible. Cities resolve their country from committed
//! rows, first match wins.

#![allow(dead_code)]

use async_trait::async_trait;
use geomigrate::adapters::database::traits::{
    Destination, InsertSession, RecordSource, SourceFailure, SourceReport,
};
use geomigrate::domain::{
    City, Country, DestinationError, OrphanPolicy, Record, Result, SourceError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Committed destination contents
#[derive(Debug, Default)]
pub struct MemoryDb {
    next_id: i64,
    pub countries: Vec<(i64, Country)>,
    pub cities: Vec<(City, Option<i64>)>,
}

impl MemoryDb {
    pub fn country_id(&self, iso_code: &str) -> Option<i64> {
        self.countries
            .iter()
            .find(|(_, c)| c.iso_code == iso_code)
            .map(|(id, _)| *id)
    }
}

/// Records the in-memory destination knows how to store
pub trait MemoryRecord: Record + Clone {
    fn check(&self, db: &MemoryDb, policy: OrphanPolicy) -> std::result::Result<(), DestinationError>;
    fn store(self, db: &mut MemoryDb);
}

impl MemoryRecord for Country {
    fn check(&self, _db: &MemoryDb, _policy: OrphanPolicy) -> std::result::Result<(), DestinationError> {
        Ok(())
    }

    fn store(self, db: &mut MemoryDb) {
        db.next_id += 1;
        let id = db.next_id;
        db.countries.push((id, self));
    }
}

impl MemoryRecord for City {
    fn check(&self, db: &MemoryDb, policy: OrphanPolicy) -> std::result::Result<(), DestinationError> {
        if policy == OrphanPolicy::Reject && db.country_id(&self.country_iso_code).is_none() {
            return Err(DestinationError::MissingParent(self.country_iso_code.clone()));
        }
        Ok(())
    }

    fn store(self, db: &mut MemoryDb) {
        let country_id = db.country_id(&self.country_iso_code);
        db.cities.push((self, country_id));
    }
}

#[derive(Default)]
struct Inner {
    db: Mutex<MemoryDb>,
    fail_keys: HashSet<String>,
    fail_begins: AtomicUsize,
    fail_prepares: AtomicUsize,
    fail_commits: AtomicUsize,
    insert_delay: Option<Duration>,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

/// Consumes one injected failure, if any are left
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// In-memory stand-in for the PostgreSQL destination
#[derive(Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Inner>,
    policy: OrphanPolicy,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(mut self, apply: impl FnOnce(&mut Inner)) -> Self {
        let inner = Arc::get_mut(&mut self.inner).expect("configure before sharing");
        apply(inner);
        self
    }

    pub fn with_policy(mut self, policy: OrphanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn failing_key(self, key: &str) -> Self {
        let key = key.to_string();
        self.configure(|inner| {
            inner.fail_keys.insert(key);
        })
    }

    pub fn failing_begins(self, n: usize) -> Self {
        self.configure(|inner| inner.fail_begins = AtomicUsize::new(n))
    }

    pub fn failing_prepares(self, n: usize) -> Self {
        self.configure(|inner| inner.fail_prepares = AtomicUsize::new(n))
    }

    pub fn failing_commits(self, n: usize) -> Self {
        self.configure(|inner| inner.fail_commits = AtomicUsize::new(n))
    }

    pub fn with_insert_delay(self, delay: Duration) -> Self {
        self.configure(|inner| inner.insert_delay = Some(delay))
    }

    /// Shares committed contents with a destination using another policy
    pub fn sharing_with(&self, policy: OrphanPolicy) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            policy,
        }
    }

    pub fn countries(&self) -> Vec<(i64, Country)> {
        self.inner.db.lock().unwrap().countries.clone()
    }

    pub fn cities(&self) -> Vec<(City, Option<i64>)> {
        self.inner.db.lock().unwrap().cities.clone()
    }

    pub fn seed_country(&self, country: Country) -> i64 {
        let mut db = self.inner.db.lock().unwrap();
        country.store(&mut db);
        db.next_id
    }

    pub fn begins(&self) -> usize {
        self.inner.begins.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.rollbacks.load(Ordering::SeqCst)
    }

    pub fn shared<R: MemoryRecord>(&self) -> Arc<dyn Destination<R>> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl<R: MemoryRecord> Destination<R> for MemoryDestination {
    async fn begin(&self) -> Result<Box<dyn InsertSession<R>>> {
        self.inner.begins.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.inner.fail_begins) {
            return Err(DestinationError::ConnectionFailed("injected begin failure".to_string()).into());
        }

        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
            policy: self.policy,
            prepared: false,
            staged: Vec::new(),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemorySession<R> {
    inner: Arc<Inner>,
    policy: OrphanPolicy,
    prepared: bool,
    staged: Vec<R>,
}

#[async_trait]
impl<R: MemoryRecord> InsertSession<R> for MemorySession<R> {
    async fn prepare(&mut self) -> Result<()> {
        if take_failure(&self.inner.fail_prepares) {
            return Err(DestinationError::PrepareFailed("injected prepare failure".to_string()).into());
        }
        self.prepared = true;
        Ok(())
    }

    async fn insert(&mut self, record: &R) -> Result<()> {
        if !self.prepared {
            return Err(DestinationError::PrepareFailed("insert before prepare".to_string()).into());
        }

        if let Some(delay) = self.inner.insert_delay {
            tokio::time::sleep(delay).await;
        }

        if self.inner.fail_keys.contains(&record.key()) {
            return Err(DestinationError::InsertFailed("injected row failure".to_string()).into());
        }

        {
            let db = self.inner.db.lock().unwrap();
            record.check(&db, self.policy)?;
        }

        self.staged.push(record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if take_failure(&self.inner.fail_commits) {
            return Err(DestinationError::CommitFailed("injected commit failure".to_string()).into());
        }

        let MemorySession { inner, staged, .. } = *self;
        let mut db = inner.db.lock().unwrap();
        for record in staged {
            record.store(&mut db);
        }
        inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Source over a fixed list of records
pub struct VecSource<R> {
    records: Vec<R>,
    skipped: usize,
    fail_after: Option<usize>,
}

impl<R: Record> VecSource<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            skipped: 0,
            fail_after: None,
        }
    }

    /// Reports `n` undecodable rows alongside the records
    pub fn with_skipped(mut self, n: usize) -> Self {
        self.skipped = n;
        self
    }

    /// Fails the cursor after `n` records
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn boxed(self) -> Box<dyn RecordSource<R>> {
        Box::new(self)
    }
}

impl<R: Record> RecordSource<R> for VecSource<R> {
    fn drain(
        self: Box<Self>,
        emit: &mut dyn FnMut(R) -> bool,
    ) -> std::result::Result<SourceReport, SourceFailure> {
        let VecSource {
            records,
            skipped,
            fail_after,
        } = *self;
        let mut report = SourceReport {
            skipped,
            ..SourceReport::default()
        };

        for record in records {
            if fail_after == Some(report.read) {
                return Err(SourceFailure {
                    report,
                    error: SourceError::ReadFailed("injected cursor failure".to_string()).into(),
                });
            }
            report.read += 1;
            if !emit(record) {
                report.stopped_early = true;
                break;
            }
        }

        Ok(report)
    }

    fn describe(&self) -> String {
        format!("vec:{}", self.records.len())
    }
}

pub fn cities(n: usize, iso_code: &str) -> Vec<City> {
    (0..n)
        .map(|i| City::new(format!("City {i}"), iso_code, i as f64 * 0.01, -(i as f64) * 0.01))
        .collect()
}
