//! The bounded retry driver: concurrency conflicts retry from the
//! attempt's own savepoint, other failures roll back first, and an
//! exhausted budget re-raises the original error with depth left safe.

use sql_conduit::SqlConduitError;
use sql_conduit::config::ConnectionConfig;
use sql_conduit::connection::Connection;
use sql_conduit::test_utils::{HandleCall, RecordingHandle};

fn conn() -> Connection<RecordingHandle> {
    Connection::new(RecordingHandle::new(), ConnectionConfig::new("test"))
}

fn deadlock_error() -> SqlConduitError {
    SqlConduitError::query(
        "update accounts set balance = balance - 1",
        &[],
        "SQLSTATE[40001]: Deadlock found when trying to get lock; try restarting transaction",
    )
}

#[test]
fn concurrency_conflicts_retry_until_the_work_succeeds()
-> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    let mut failures_left = 3;

    let value = conn.transaction(
        |_c| {
            if failures_left > 0 {
                failures_left -= 1;
                return Err(deadlock_error());
            }
            Ok(42)
        },
        4,
    )?;

    assert_eq!(value, 42);
    assert_eq!(conn.transaction_level(), 0);
    // Each failed attempt unwinds to its own savepoint; depth returns to 0,
    // so every attempt restarts the root transaction.
    assert_eq!(conn.handle().rollbacks_to("trans1"), 3);
    assert_eq!(conn.handle().start_count(), 4);
    assert_eq!(conn.handle().full_rollbacks(), 0);
    Ok(())
}

#[test]
fn exhausted_non_concurrency_attempts_reraise_the_original_error() {
    let mut conn = conn();

    let result: Result<(), _> = conn.transaction(
        |_c| {
            Err(SqlConduitError::query(
                "insert into t values (1)",
                &[],
                "UNIQUE constraint failed: t.id",
            ))
        },
        3,
    );

    let err = result.expect_err("budget exhausted");
    assert!(err.cause_text().contains("UNIQUE constraint failed"));
    assert_eq!(conn.transaction_level(), 0);
    assert_eq!(conn.handle().start_count(), 3);
    // The first two attempts roll back to their savepoint; the last unwinds
    // fully before propagating.
    assert_eq!(conn.handle().rollbacks_to("trans1"), 2);
    assert_eq!(conn.handle().full_rollbacks(), 1);
}

#[test]
fn exhausted_concurrency_attempts_skip_the_explicit_rollback() {
    let mut conn = conn();

    let result: Result<(), _> = conn.transaction(|_c| Err(deadlock_error()), 2);

    let err = result.expect_err("budget exhausted");
    assert!(err.cause_text().contains("Deadlock found"));
    // The server already rolled everything back on deadlock; only the local
    // counter is corrected, so no final rollback call is recorded.
    assert_eq!(conn.transaction_level(), 0);
    assert_eq!(conn.handle().rollbacks_to("trans1"), 1);
    assert_eq!(conn.handle().full_rollbacks(), 0);
}

#[test]
fn failed_pre_retry_rollback_reraises_the_work_error() {
    let mut conn = conn();
    conn.handle_mut()
        .queue_rollback_failure("disk I/O error", false);

    let result: Result<(), _> = conn.transaction(|_c| Err(deadlock_error()), 3);

    // The rollback before the retry failed; the loop ends with the work's
    // own error, not the rollback's.
    let err = result.expect_err("retry aborted");
    assert!(err.cause_text().contains("Deadlock found"));
    assert_eq!(conn.handle().start_count(), 1);
    assert_eq!(conn.handle().rollbacks_to("trans1"), 1);
    assert_eq!(conn.transaction_level(), 1);
}

#[test]
fn begin_retries_the_root_start_after_a_lost_connection()
-> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.handle_mut()
        .queue_start_failure("MySQL server has gone away", true);

    conn.begin_transaction()?;

    assert_eq!(conn.transaction_level(), 1);
    assert_eq!(conn.handle().start_count(), 2);
    assert!(conn.handle().calls.contains(&HandleCall::Reconnect));
    Ok(())
}

#[test]
fn begin_propagates_the_original_error_when_the_session_is_fine() {
    let mut conn = conn();
    conn.handle_mut()
        .queue_start_failure("syntax error near 'BEGIN'", false);

    let err = conn.begin_transaction().expect_err("start failed");
    assert!(err.cause_text().contains("syntax error"));
    assert_eq!(conn.transaction_level(), 0);
    assert_eq!(conn.handle().start_count(), 1);
}

#[test]
fn begin_propagates_the_original_error_when_reconnect_fails() {
    let mut conn = conn();
    conn.handle_mut()
        .queue_start_failure("MySQL server has gone away", true);
    conn.handle_mut().refuse_reconnect();

    let err = conn.begin_transaction().expect_err("start failed");
    assert!(err.cause_text().contains("gone away"));
    assert_eq!(conn.transaction_level(), 0);
    assert_eq!(conn.handle().start_count(), 1);
}

#[test]
fn deadlocked_commit_retries_the_attempt() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.handle_mut()
        .queue_commit_failure("ERROR: deadlock detected", false);
    let mut runs = 0;

    let value = conn.transaction(
        |_c| {
            runs += 1;
            Ok("done")
        },
        2,
    )?;

    assert_eq!(value, "done");
    assert_eq!(runs, 2);
    assert_eq!(conn.transaction_level(), 0);
    assert_eq!(conn.handle().start_count(), 2);
    Ok(())
}

#[test]
fn lost_connection_during_commit_forces_depth_to_zero() {
    let mut conn = conn();
    conn.begin_transaction().expect("begin");
    conn.handle_mut()
        .queue_commit_failure("MySQL server has gone away", true);

    let err = conn.commit().expect_err("commit failed");
    assert!(err.cause_text().contains("gone away"));
    assert_eq!(conn.transaction_level(), 0);
}

#[test]
fn failed_commit_with_a_live_session_keeps_the_depth() {
    let mut conn = conn();
    conn.begin_transaction().expect("begin");
    conn.handle_mut()
        .queue_commit_failure("disk I/O error", false);

    conn.commit().expect_err("commit failed");
    assert_eq!(conn.transaction_level(), 1);
}

#[test]
fn successful_commit_ends_the_loop_immediately() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    let mut runs = 0;

    let value = conn.transaction(
        |_c| {
            runs += 1;
            Ok(runs)
        },
        5,
    )?;

    assert_eq!(value, 1);
    assert_eq!(runs, 1);
    assert_eq!(conn.handle().start_count(), 1);
    Ok(())
}
