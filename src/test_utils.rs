//! Scripted [`RawHandle`] for exercising the connection without a real
//! database. Records every call it receives and plays back queued failures,
//! lost-connection events, and canned row sets.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::handle::RawHandle;
use crate::row::Row;
use crate::value::SqlValue;

/// One call observed by a [`RecordingHandle`].
#[derive(Debug, Clone, PartialEq)]
pub enum HandleCall {
    Query(String),
    StartTransaction,
    CommitTransaction,
    Rollback(Option<String>),
    CreateSavepoint(String),
    Reconnect,
}

/// A `RawHandle` that records calls and plays back scripted outcomes.
#[derive(Debug, Default)]
pub struct RecordingHandle {
    /// Every call received, in order.
    pub calls: Vec<HandleCall>,
    last_error: Option<String>,
    lost: bool,
    reconnect_fails: bool,
    start_failures: VecDeque<(String, bool)>,
    commit_failures: VecDeque<(String, bool)>,
    rollback_failures: VecDeque<(String, bool)>,
    query_failures: VecDeque<String>,
    canned_rows: VecDeque<Vec<Row>>,
}

impl RecordingHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from column names and values, for canned results.
    #[must_use]
    pub fn row(columns: &[&str], values: Vec<SqlValue>) -> Row {
        let names = Arc::new(columns.iter().map(|c| (*c).to_string()).collect::<Vec<_>>());
        Row::new(names, values)
    }

    /// Queue a row set for the next `query_rows` call.
    pub fn queue_rows(&mut self, rows: Vec<Row>) {
        self.canned_rows.push_back(rows);
    }

    /// Queue a failure (with the given error text) for the next
    /// statement-running call.
    pub fn queue_query_failure(&mut self, message: impl Into<String>) {
        self.query_failures.push_back(message.into());
    }

    /// Script the next `start_transaction` call to fail. `lost` marks the
    /// session as severed afterward.
    pub fn queue_start_failure(&mut self, message: impl Into<String>, lost: bool) {
        self.start_failures.push_back((message.into(), lost));
    }

    /// Script the next `commit_transaction` call to fail.
    pub fn queue_commit_failure(&mut self, message: impl Into<String>, lost: bool) {
        self.commit_failures.push_back((message.into(), lost));
    }

    /// Script the next `rollback_transaction` call to fail.
    pub fn queue_rollback_failure(&mut self, message: impl Into<String>, lost: bool) {
        self.rollback_failures.push_back((message.into(), lost));
    }

    /// Make subsequent `reconnect` calls fail.
    pub fn refuse_reconnect(&mut self) {
        self.reconnect_fails = true;
    }

    /// Number of recorded statement-running calls.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HandleCall::Query(_)))
            .count()
    }

    /// Number of recorded `start_transaction` calls.
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HandleCall::StartTransaction))
            .count()
    }

    /// Number of recorded rollbacks to the named savepoint.
    #[must_use]
    pub fn rollbacks_to(&self, savepoint: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HandleCall::Rollback(Some(name)) if name == savepoint))
            .count()
    }

    /// Number of recorded full rollbacks.
    #[must_use]
    pub fn full_rollbacks(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HandleCall::Rollback(None)))
            .count()
    }

    fn scripted_query_failure(&mut self) -> bool {
        if let Some(message) = self.query_failures.pop_front() {
            self.last_error = Some(message);
            true
        } else {
            false
        }
    }
}

impl RawHandle for RecordingHandle {
    fn query_rows(&mut self, sql: &str) -> Option<Vec<Row>> {
        self.last_error = None;
        self.calls.push(HandleCall::Query(sql.to_string()));
        if self.scripted_query_failure() {
            return None;
        }
        Some(self.canned_rows.pop_front().unwrap_or_default())
    }

    fn query_affected(&mut self, sql: &str) -> Option<u64> {
        self.last_error = None;
        self.calls.push(HandleCall::Query(sql.to_string()));
        if self.scripted_query_failure() {
            return None;
        }
        Some(1)
    }

    fn query_ok(&mut self, sql: &str) -> bool {
        self.last_error = None;
        self.calls.push(HandleCall::Query(sql.to_string()));
        !self.scripted_query_failure()
    }

    fn start_transaction(&mut self) -> bool {
        self.last_error = None;
        self.calls.push(HandleCall::StartTransaction);
        if let Some((message, lost)) = self.start_failures.pop_front() {
            self.last_error = Some(message);
            self.lost = lost;
            return false;
        }
        true
    }

    fn commit_transaction(&mut self) -> bool {
        self.last_error = None;
        self.calls.push(HandleCall::CommitTransaction);
        if let Some((message, lost)) = self.commit_failures.pop_front() {
            self.last_error = Some(message);
            self.lost = lost;
            return false;
        }
        true
    }

    fn rollback_transaction(&mut self, savepoint: Option<&str>) -> bool {
        self.last_error = None;
        self.calls
            .push(HandleCall::Rollback(savepoint.map(String::from)));
        if let Some((message, lost)) = self.rollback_failures.pop_front() {
            self.last_error = Some(message);
            self.lost = lost;
            return false;
        }
        true
    }

    fn create_savepoint(&mut self, name: &str) -> bool {
        self.last_error = None;
        self.calls.push(HandleCall::CreateSavepoint(name.to_string()));
        true
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn connection_lost(&self) -> bool {
        self.lost
    }

    fn reconnect(&mut self) -> bool {
        self.calls.push(HandleCall::Reconnect);
        if self.reconnect_fails {
            return false;
        }
        self.lost = false;
        true
    }
}
