use std::path::Path;

use crate::error::SqlConduitError;
use crate::handle::RawHandle;
use crate::row::Row;

use super::query::collect_rows;

/// `RawHandle` over an in-process `rusqlite::Connection`.
///
/// Driver errors are not raised directly; they land in the last-error slot
/// and the call returns its failure sentinel, matching the contract of the
/// legacy handles this adapter targets. The connection is in-process, so
/// the session can never be lost.
pub struct SqliteHandle {
    conn: rusqlite::Connection,
    last_error: Option<String>,
}

impl SqliteHandle {
    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns `SqlConduitError::ConnectionError` if the file cannot be
    /// opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqlConduitError> {
        let conn = rusqlite::Connection::open(path).map_err(|e| {
            SqlConduitError::ConnectionError(format!("failed to open SQLite database: {e}"))
        })?;
        Ok(Self {
            conn,
            last_error: None,
        })
    }

    /// Open a fresh in-memory database.
    ///
    /// # Errors
    /// Returns `SqlConduitError::ConnectionError` if the database cannot be
    /// created.
    pub fn open_in_memory() -> Result<Self, SqlConduitError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(|e| {
            SqlConduitError::ConnectionError(format!("failed to open SQLite database: {e}"))
        })?;
        Ok(Self {
            conn,
            last_error: None,
        })
    }

    /// Borrow the raw driver connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    fn record<T>(&mut self, result: Result<T, rusqlite::Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }
}

impl RawHandle for SqliteHandle {
    fn query_rows(&mut self, sql: &str) -> Option<Vec<Row>> {
        self.last_error = None;
        let result = collect_rows(&self.conn, sql);
        self.record(result)
    }

    fn query_affected(&mut self, sql: &str) -> Option<u64> {
        self.last_error = None;
        let result = self.conn.execute(sql, []).map(|n| n as u64);
        self.record(result)
    }

    fn query_ok(&mut self, sql: &str) -> bool {
        self.last_error = None;
        let result = self.conn.execute_batch(sql);
        self.record(result).is_some()
    }

    fn start_transaction(&mut self) -> bool {
        // A savepoint rollback leaves the driver transaction open; a fresh
        // BEGIN inside it would fail, so reuse the open transaction.
        if !self.conn.is_autocommit() {
            self.last_error = None;
            return true;
        }
        self.query_ok("BEGIN")
    }

    fn commit_transaction(&mut self) -> bool {
        self.query_ok("COMMIT")
    }

    fn rollback_transaction(&mut self, savepoint: Option<&str>) -> bool {
        match savepoint {
            Some(name) => self.query_ok(&format!("ROLLBACK TO SAVEPOINT {name}")),
            None => self.query_ok("ROLLBACK"),
        }
    }

    fn create_savepoint(&mut self, name: &str) -> bool {
        self.query_ok(&format!("SAVEPOINT {name}"))
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn connection_lost(&self) -> bool {
        false
    }

    fn reconnect(&mut self) -> bool {
        true
    }
}
