//! Primitive executor: every statement that reaches the handle goes through
//! [`Connection::run`], which times it, translates side-channel failures
//! into [`SqlConduitError::Query`], and appends to the query log. Pretend
//! mode bypasses the handle entirely and returns the primitive's empty
//! identity.

use std::time::Instant;

use crate::error::SqlConduitError;
use crate::handle::{RawHandle, has_pending_error};
use crate::log::QueryLogEntry;
use crate::row::Row;
use crate::value::SqlValue;

use super::Connection;

impl<H: RawHandle> Connection<H> {
    pub(crate) fn run<T>(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
        pretend_value: T,
        op: impl FnOnce(&mut H, &str) -> Option<T>,
    ) -> Result<T, SqlConduitError> {
        let start = Instant::now();

        if self.pretending {
            let elapsed_secs = start.elapsed().as_secs_f64();
            tracing::debug!(sql, bindings = bindings.len(), pretend = true, "statement pretended");
            self.log_query(sql, bindings, elapsed_secs);
            return Ok(pretend_value);
        }

        let value = match op(&mut self.handle, sql) {
            Some(value) if !has_pending_error(&self.handle) => value,
            _ => {
                let cause = self
                    .handle
                    .last_error()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "handle reported failure without error text".to_string());
                return Err(SqlConduitError::query(sql, bindings, cause));
            }
        };

        let elapsed_secs = start.elapsed().as_secs_f64();
        tracing::debug!(sql, bindings = bindings.len(), elapsed_secs, "statement executed");
        self.log_query(sql, bindings, elapsed_secs);
        Ok(value)
    }

    pub(crate) fn log_query(&mut self, sql: &str, bindings: &[SqlValue], elapsed_secs: f64) {
        if self.logging {
            self.query_log.push(QueryLogEntry {
                sql: sql.to_string(),
                bindings: bindings.to_vec(),
                elapsed_secs,
            });
        }
    }

    pub(crate) fn run_select(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<Vec<Row>, SqlConduitError> {
        self.run(sql, bindings, Vec::new(), |handle, sql| handle.query_rows(sql))
    }

    pub(crate) fn run_affecting(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<u64, SqlConduitError> {
        self.run(sql, bindings, 0, |handle, sql| handle.query_affected(sql))
    }

    pub(crate) fn run_statement(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<bool, SqlConduitError> {
        self.run(sql, bindings, true, |handle, sql| {
            handle.query_ok(sql).then_some(true)
        })
    }

    pub(crate) fn run_start_transaction(&mut self) -> Result<bool, SqlConduitError> {
        self.run("START TRANSACTION", &[], true, |handle, _| {
            handle.start_transaction().then_some(true)
        })
    }

    pub(crate) fn run_commit(&mut self) -> Result<bool, SqlConduitError> {
        self.run("COMMIT", &[], true, |handle, _| {
            handle.commit_transaction().then_some(true)
        })
    }

    pub(crate) fn run_rollback(&mut self, savepoint: Option<&str>) -> Result<bool, SqlConduitError> {
        let sql = match savepoint {
            Some(name) => format!("ROLLBACK TO SAVEPOINT {name}"),
            None => "ROLLBACK".to_string(),
        };
        self.run(&sql, &[], true, |handle, _| {
            handle.rollback_transaction(savepoint).then_some(true)
        })
    }

    pub(crate) fn run_create_savepoint(&mut self, name: &str) -> Result<bool, SqlConduitError> {
        let sql = format!("SAVEPOINT {name}");
        self.run(&sql, &[], true, |handle, _| {
            handle.create_savepoint(name).then_some(true)
        })
    }
}
