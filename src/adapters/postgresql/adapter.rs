//! PostgreSQL adapter implementing the destination traits
//!
//! Each session owns one pooled connection and one explicit transaction.
//! Inserts run under a savepoint so a rejected row does not poison the
//! transaction for the rows that follow it.

use crate::adapters::database::traits::{Destination, InsertSession};
use crate::adapters::postgresql::client::PostgresClient;
use crate::adapters::postgresql::models::PostgresRecord;
use crate::domain::{DestinationError, OrphanPolicy, Result};
use async_trait::async_trait;
use deadpool_postgres::Object;
use std::marker::PhantomData;
use tokio_postgres::Statement;

const ROW_SAVEPOINT: &str = "SAVEPOINT geomigrate_row";
const RELEASE_ROW_SAVEPOINT: &str = "RELEASE SAVEPOINT geomigrate_row";
const ROLLBACK_ROW_SAVEPOINT: &str = "ROLLBACK TO SAVEPOINT geomigrate_row";

/// PostgreSQL implementation of [`Destination`]
pub struct PostgresDestination {
    client: PostgresClient,
    orphan_policy: OrphanPolicy,
}

impl PostgresDestination {
    /// Create a new PostgreSQL destination
    pub fn new(client: PostgresClient, orphan_policy: OrphanPolicy) -> Self {
        Self {
            client,
            orphan_policy,
        }
    }
}

#[async_trait]
impl<R: PostgresRecord> Destination<R> for PostgresDestination {
    async fn begin(&self) -> Result<Box<dyn InsertSession<R>>> {
        let conn = self.client.get_connection().await?;

        let timeout = self.client.statement_timeout_sql();
        let started = match conn.batch_execute(&timeout).await {
            Ok(()) => conn.batch_execute("BEGIN").await,
            Err(e) => Err(e),
        };
        if let Err(e) = started {
            // Nothing is open yet, but the connection state is unknown.
            drop(Object::take(conn));
            return Err(DestinationError::TransactionFailed(e.to_string()).into());
        }

        Ok(Box::new(PostgresSession::<R> {
            conn: Some(conn),
            statement: None,
            sql: R::insert_sql(self.orphan_policy),
            require_parent: self.orphan_policy == OrphanPolicy::Reject,
            _record: PhantomData,
        }))
    }

    fn describe(&self) -> String {
        self.client.connection_string_safe().to_string()
    }
}

/// One open transaction on a dedicated connection
///
/// `conn` is `None` once the session has committed or rolled back. A session
/// dropped while still holding its connection detaches that connection from
/// the pool, so the server discards the open transaction when it closes.
struct PostgresSession<R> {
    conn: Option<Object>,
    statement: Option<Statement>,
    sql: &'static str,
    require_parent: bool,
    _record: PhantomData<fn(&R)>,
}

impl<R> PostgresSession<R> {
    fn connection(&self) -> Result<&Object> {
        self.conn.as_ref().ok_or_else(|| {
            DestinationError::TransactionFailed("session already finished".to_string()).into()
        })
    }

    async fn finish(&mut self, sql: &str) -> std::result::Result<(), tokio_postgres::Error> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        match conn.batch_execute(sql).await {
            Ok(()) => Ok(()),
            Err(e) => {
                drop(Object::take(conn));
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<R: PostgresRecord> InsertSession<R> for PostgresSession<R> {
    async fn prepare(&mut self) -> Result<()> {
        let statement = self
            .connection()?
            .prepare(self.sql)
            .await
            .map_err(|e| DestinationError::PrepareFailed(e.to_string()))?;
        self.statement = Some(statement);
        Ok(())
    }

    async fn insert(&mut self, record: &R) -> Result<()> {
        let conn = self.connection()?;
        let statement = self.statement.as_ref().ok_or_else(|| {
            DestinationError::PrepareFailed("insert before prepare".to_string())
        })?;

        conn.batch_execute(ROW_SAVEPOINT)
            .await
            .map_err(|e| DestinationError::TransactionFailed(e.to_string()))?;

        match conn.execute(statement, &record.params()).await {
            Ok(0) if self.require_parent => {
                conn.batch_execute(RELEASE_ROW_SAVEPOINT)
                    .await
                    .map_err(|e| DestinationError::TransactionFailed(e.to_string()))?;
                let parent = record.parent_key().unwrap_or_default().to_string();
                Err(DestinationError::MissingParent(parent).into())
            }
            Ok(_) => {
                conn.batch_execute(RELEASE_ROW_SAVEPOINT)
                    .await
                    .map_err(|e| DestinationError::TransactionFailed(e.to_string()))?;
                Ok(())
            }
            Err(e) => {
                conn.batch_execute(ROLLBACK_ROW_SAVEPOINT)
                    .await
                    .map_err(|e| DestinationError::TransactionFailed(e.to_string()))?;
                Err(DestinationError::InsertFailed(e.to_string()).into())
            }
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut session = self;
        session
            .finish("COMMIT")
            .await
            .map_err(|e| DestinationError::CommitFailed(e.to_string()).into())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut session = self;
        session
            .finish("ROLLBACK")
            .await
            .map_err(|e| DestinationError::RollbackFailed(e.to_string()).into())
    }
}

impl<R> Drop for PostgresSession<R> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::debug!("Discarding unfinished transaction");
            drop(Object::take(conn));
        }
    }
}
