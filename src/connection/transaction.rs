//! Nested-transaction state machine.
//!
//! Depth is a plain counter: 0 means idle, and depth n means savepoints
//! `trans1..transn` are open. Commit always collapses the whole stack;
//! rollback targets a level and returns the counter to just below it. The
//! retry driver in [`Connection::transaction`] wraps a work closure in a
//! bounded loop, retrying on classified concurrency conflicts.

use crate::error::SqlConduitError;
use crate::handle::RawHandle;

use super::Connection;

/// Deterministic savepoint name for a nesting level.
#[must_use]
pub fn savepoint_name(level: usize) -> String {
    format!("trans{level}")
}

impl<H: RawHandle> Connection<H> {
    /// Current nested transaction depth; 0 when no transaction is open.
    #[must_use]
    pub fn transaction_level(&self) -> usize {
        self.transactions
    }

    /// Open a transaction level.
    ///
    /// At depth 0 this starts a root transaction on the handle, retrying the
    /// start once if the session was lost and could be re-established. A
    /// savepoint is then created for the new level and the depth counter
    /// incremented. Note the root level gets a savepoint too (`trans1`);
    /// legacy behavior preserved so the retry loop can roll back to the very
    /// first statement without closing the root transaction.
    ///
    /// # Errors
    /// Propagates the original start failure when the root transaction
    /// cannot be opened, or the savepoint failure; depth is unchanged on
    /// error.
    pub fn begin_transaction(&mut self) -> Result<(), SqlConduitError> {
        if self.transactions == 0 {
            self.create_root_transaction()?;
        }

        let name = savepoint_name(self.transactions + 1);
        self.run_create_savepoint(&name)?;
        self.transactions += 1;
        tracing::debug!(depth = self.transactions, savepoint = %name, "transaction begun");
        Ok(())
    }

    /// Alias for [`Connection::begin_transaction`].
    ///
    /// # Errors
    /// Same as [`Connection::begin_transaction`].
    pub fn savepoint(&mut self) -> Result<(), SqlConduitError> {
        self.begin_transaction()
    }

    fn create_root_transaction(&mut self) -> Result<(), SqlConduitError> {
        match self.run_start_transaction() {
            Ok(_) => Ok(()),
            Err(original) => {
                // One reconnect-and-retry; the original error wins if the
                // second start fails too.
                if self.handle.connection_lost()
                    && self.handle.reconnect()
                    && self.run_start_transaction().is_ok()
                {
                    return Ok(());
                }
                Err(original)
            }
        }
    }

    /// Commit the open transaction.
    ///
    /// A successful commit collapses all nesting: depth returns to 0 no
    /// matter how many levels were open.
    ///
    /// # Errors
    /// Propagates the commit failure. Depth is left untouched so an
    /// enclosing retry loop can decide what to do, except when the session
    /// was lost, which forces depth to 0.
    pub fn commit(&mut self) -> Result<(), SqlConduitError> {
        match self.run_commit() {
            Ok(_) => {
                self.transactions = 0;
                tracing::debug!("transaction committed");
                Ok(())
            }
            Err(error) => {
                if self.handle.connection_lost() {
                    self.transactions = 0;
                }
                Err(error)
            }
        }
    }

    /// Roll back to a transaction level.
    ///
    /// `None` targets the current depth, undoing the most recent savepoint:
    /// at depth 3 this issues `ROLLBACK TO SAVEPOINT trans3` and leaves
    /// depth 2. An explicit target of 0 issues a full `ROLLBACK`. On
    /// success depth becomes `target - 1` (0 for a full rollback).
    ///
    /// Out-of-range targets (negative, above the current depth, or anything
    /// while idle) are deliberately a silent no-op rather than an error;
    /// callers unwinding after partial failures should not have to care
    /// whether a level is still open.
    ///
    /// # Errors
    /// Propagates the rollback failure; a lost session additionally forces
    /// depth to 0.
    pub fn roll_back(&mut self, to_level: Option<i64>) -> Result<(), SqlConduitError> {
        let depth = self.transactions as i64;
        let target = to_level.unwrap_or(depth);
        if self.transactions == 0 || target < 0 || target > depth {
            return Ok(());
        }

        let result = if target == 0 {
            self.run_rollback(None)
        } else {
            let name = savepoint_name(target as usize);
            self.run_rollback(Some(&name))
        };

        match result {
            Ok(_) => {
                self.transactions = if target == 0 { 0 } else { (target - 1) as usize };
                tracing::debug!(depth = self.transactions, "rolled back");
                Ok(())
            }
            Err(error) => {
                if self.handle.connection_lost() {
                    self.transactions = 0;
                }
                Err(error)
            }
        }
    }

    /// Run `work` inside a transaction, retrying up to `max_attempts` times.
    ///
    /// Classified concurrency conflicts (deadlocks, lock waits) are rolled
    /// back to the attempt's own savepoint and retried; other failures get
    /// an explicit rollback first but are retried on the same budget. Once
    /// the budget is exhausted, the original triggering error is propagated
    /// and depth is left at 0. A pre-retry rollback that itself fails ends
    /// the loop with the work's error, not the rollback's. A successful
    /// commit returns the work's result immediately.
    ///
    /// Retries are immediate; there is no backoff between attempts.
    ///
    /// # Errors
    /// The last error raised by `work` or by the begin/commit machinery.
    pub fn transaction<T, F>(
        &mut self,
        mut work: F,
        max_attempts: usize,
    ) -> Result<T, SqlConduitError>
    where
        F: FnMut(&mut Self) -> Result<T, SqlConduitError>,
    {
        for attempt in 1..=max_attempts {
            self.begin_transaction()?;

            let value = match work(self) {
                Ok(value) => value,
                Err(error) => {
                    self.handle_work_failure(error, attempt, max_attempts)?;
                    continue;
                }
            };

            match self.commit() {
                Ok(()) => return Ok(value),
                Err(error) => {
                    self.handle_commit_failure(error, attempt, max_attempts)?;
                    continue;
                }
            }
        }

        Err(SqlConduitError::ExecutionError(
            "transaction requires at least one attempt".to_string(),
        ))
    }

    /// Decide what a failed work closure means for the retry loop: `Ok` to
    /// retry, `Err` to propagate.
    fn handle_work_failure(
        &mut self,
        error: SqlConduitError,
        attempt: usize,
        max_attempts: usize,
    ) -> Result<(), SqlConduitError> {
        let concurrency = self.classifier.is_concurrency_error(&error.cause_text());
        let attempts_remain = attempt < max_attempts;

        if concurrency {
            if attempts_remain {
                // The server kept the transaction open; unwind this
                // attempt's own level and go again.
                tracing::debug!(attempt, "concurrency conflict, retrying");
                let depth = self.transactions as i64;
                return self.roll_back_for_retry(depth, error);
            }
            // On deadlock the server has already rolled everything back;
            // only the local counter needs correcting.
            self.transactions = 0;
            return Err(error);
        }

        if attempts_remain {
            let depth = self.transactions as i64;
            return self.roll_back_for_retry(depth.max(1), error);
        }

        // Budget exhausted: unwind fully, but the work's error is the one
        // the caller sees even if the rollback itself fails.
        if let Err(rollback_error) = self.roll_back(Some(0)) {
            tracing::warn!(error = %rollback_error, "rollback after exhausted retries failed");
        }
        Err(error)
    }

    /// Unwind to `target` before a retry. A failed rollback ends the loop:
    /// the work's error is re-raised, never the rollback's own.
    fn roll_back_for_retry(
        &mut self,
        target: i64,
        work_error: SqlConduitError,
    ) -> Result<(), SqlConduitError> {
        if let Err(rollback_error) = self.roll_back(Some(target)) {
            tracing::warn!(error = %rollback_error, "rollback before retry failed");
            return Err(work_error);
        }
        Ok(())
    }

    /// Decide what a failed commit means for the retry loop: `Ok` to retry
    /// the whole attempt, `Err` to propagate.
    fn handle_commit_failure(
        &mut self,
        error: SqlConduitError,
        attempt: usize,
        max_attempts: usize,
    ) -> Result<(), SqlConduitError> {
        let concurrency = self.classifier.is_concurrency_error(&error.cause_text());
        if concurrency && attempt < max_attempts {
            // A deadlocked commit left nothing open server-side; reset and
            // re-run the attempt from the top.
            self.transactions = 0;
            tracing::debug!(attempt, "commit hit concurrency conflict, retrying");
            return Ok(());
        }
        // commit() already forced depth to 0 if the session was lost.
        Err(error)
    }
}
