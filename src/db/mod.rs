//! Database layer for the task tree.
//!
//! All access goes through one SQLite connection behind a mutex, and every
//! structural edit runs in a single transaction while the lock is held. That
//! serializes the read-sort-renumber-write cycle of the sequencer and keeps
//! readers from seeing a half-renumbered sibling group.

pub mod moves;
pub mod render;
pub mod state;
pub mod tasks;

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    /// Offset used for calendar-day decisions (schedules, due-date warnings).
    reporting_offset: FixedOffset,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            reporting_offset: utc_offset(),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Use `offset` as the reporting timezone.
    pub fn with_reporting_offset(mut self, offset: FixedOffset) -> Self {
        self.reporting_offset = offset;
        self
    }

    pub fn reporting_offset(&self) -> FixedOffset {
        self.reporting_offset
    }

    /// `at` in the reporting timezone.
    pub fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.reporting_offset)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function inside a transaction, committing only if it succeeds.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert stored milliseconds back to a timestamp; `None` when out of range.
pub fn from_ms(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Read a millisecond timestamp column, failing the row when the stored
/// value is outside chrono's range.
pub(crate) fn get_timestamp(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(column)?;
    from_ms(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            row.as_ref().column_index(column).unwrap_or(0),
            Type::Integer,
            format!("timestamp out of range: {} ms", ms).into(),
        )
    })
}
