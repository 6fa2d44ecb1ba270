//! SQLite storage for candidates, voters and votes
//!
//! [`Store`] owns the connection pool. Reads go straight to the pool; every
//! write goes through [`Store::begin_write`], which hands out a
//! [`WriteTransaction`]:
//! 1. An in-process write gate is acquired, so writers never contend for the
//!    SQLite write lock and each one observes everything committed before it
//! 2. A SQLite transaction is opened on a pooled connection
//! 3. `commit` or `rollback` ends it; dropping it without either rolls back
//! 4. The gate is released when the transaction value goes away, on every path

pub mod schema;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::DatabaseConfig;
use crate::types::{
    Candidate, CandidateId, Vote, VoteId, Voter, VoterId, VoterIdentifier,
};
use crate::{Error, Result};

/// Handle to the election database
///
/// Cloning is cheap and every clone shares the same pool and write gate.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl Store {
    /// Open (creating if needed) the database described by `config` and ensure the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

        if config.is_in_memory() {
            // Each connection would get its own empty database, so keep exactly one alive
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options.connect_with(options).await?;
        schema::create_schema(&pool).await?;

        tracing::info!(
            url = %config.url,
            max_connections = config.max_connections,
            "🗄️  Election store ready"
        );

        Ok(Self {
            pool,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Fresh private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::for_testing()).await
    }

    /// Underlying pool for read-only queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a serialized write transaction
    ///
    /// `operation` names the transaction in logs.
    pub async fn begin_write(&self, operation: &'static str) -> Result<WriteTransaction> {
        let gate = self.write_gate.clone().lock_owned().await;
        let tx = self.pool.begin().await?;

        tracing::trace!(operation, "write transaction started");

        Ok(WriteTransaction {
            tx,
            operation,
            _gate: gate,
        })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// A SQLite transaction holding the store's write gate
///
/// Field order matters: the transaction is dropped (and rolled back if still
/// open) before the gate is released.
pub struct WriteTransaction {
    tx: Transaction<'static, Sqlite>,
    operation: &'static str,
    _gate: OwnedMutexGuard<()>,
}

impl WriteTransaction {
    /// Connection to run statements on inside this transaction
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Make every statement of this transaction durable
    pub async fn commit(self) -> Result<()> {
        let Self {
            tx,
            operation,
            _gate,
        } = self;
        tx.commit().await?;
        tracing::trace!(operation, "write transaction committed");
        Ok(())
    }

    /// Discard every statement of this transaction
    pub async fn rollback(self) -> Result<()> {
        let Self {
            tx,
            operation,
            _gate,
        } = self;
        tx.rollback().await?;
        tracing::trace!(operation, "write transaction rolled back");
        Ok(())
    }
}

impl std::fmt::Debug for WriteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransaction")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Map a `candidates` row into a [`Candidate`].
pub(crate) fn candidate_from_row(row: &SqliteRow) -> Result<Candidate> {
    Ok(Candidate {
        id: CandidateId(row.try_get("id")?),
        name: row.try_get("name")?,
        party: row.try_get("party")?,
        ballot_number: row.try_get("ballot_number")?,
        office: row.try_get("office")?,
        vote_count: row.try_get("vote_count")?,
        active: row.try_get("active")?,
        registered_at: row.try_get::<DateTime<Utc>, _>("registered_at")?,
    })
}

/// Map a `voters` row into a [`Voter`].
pub(crate) fn voter_from_row(row: &SqliteRow) -> Result<Voter> {
    let identifier: String = row.try_get("identifier")?;
    let identifier = VoterIdentifier::parse(&identifier)
        .map_err(|_| Error::internal(format!("malformed identifier '{identifier}' in voters")))?;

    Ok(Voter {
        id: VoterId(row.try_get("id")?),
        identifier,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        has_voted: row.try_get("has_voted")?,
        registered_at: row.try_get::<DateTime<Utc>, _>("registered_at")?,
    })
}

/// Map a `votes` row into a [`Vote`].
pub(crate) fn vote_from_row(row: &SqliteRow) -> Result<Vote> {
    let identifier: String = row.try_get("voter_identifier")?;
    let voter_identifier = VoterIdentifier::parse(&identifier)
        .map_err(|_| Error::internal(format!("malformed identifier '{identifier}' in votes")))?;

    Ok(Vote {
        id: VoteId(row.try_get("id")?),
        voter_identifier,
        candidate_id: CandidateId(row.try_get("candidate_id")?),
        office: row.try_get("office")?,
        cast_at: row.try_get::<DateTime<Utc>, _>("cast_at")?,
    })
}
