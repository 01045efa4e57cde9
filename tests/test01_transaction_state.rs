//! Depth bookkeeping for the nested-transaction state machine: commit
//! collapses all levels, rollback targets map to savepoint names, and
//! out-of-range rollbacks are silent no-ops.

use sql_conduit::config::ConnectionConfig;
use sql_conduit::connection::Connection;
use sql_conduit::test_utils::{HandleCall, RecordingHandle};

fn conn() -> Connection<RecordingHandle> {
    Connection::new(RecordingHandle::new(), ConnectionConfig::new("test"))
}

#[test]
fn depth_starts_at_zero_and_tracks_begins() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    assert_eq!(conn.transaction_level(), 0);

    conn.begin_transaction()?;
    assert_eq!(conn.transaction_level(), 1);
    conn.begin_transaction()?;
    assert_eq!(conn.transaction_level(), 2);
    conn.savepoint()?;
    assert_eq!(conn.transaction_level(), 3);

    // The root start happens once; every level gets its own savepoint.
    assert_eq!(conn.handle().start_count(), 1);
    let savepoints: Vec<_> = conn
        .handle()
        .calls
        .iter()
        .filter_map(|c| match c {
            HandleCall::CreateSavepoint(name) => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(savepoints, vec!["trans1", "trans2", "trans3"]);
    Ok(())
}

#[test]
fn commit_collapses_all_nesting() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.begin_transaction()?;
    conn.begin_transaction()?;
    conn.commit()?;
    assert_eq!(conn.transaction_level(), 0);
    Ok(())
}

#[test]
fn default_rollback_undoes_the_most_recent_savepoint()
-> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.begin_transaction()?;
    conn.begin_transaction()?;
    conn.begin_transaction()?;
    assert_eq!(conn.transaction_level(), 3);

    conn.roll_back(None)?;
    assert_eq!(conn.transaction_level(), 2);
    assert_eq!(conn.handle().rollbacks_to("trans3"), 1);
    assert_eq!(conn.handle().full_rollbacks(), 0);
    Ok(())
}

#[test]
fn out_of_range_rollback_is_a_no_op() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.begin_transaction()?;
    conn.begin_transaction()?;
    let calls_before = conn.handle().calls.len();

    conn.roll_back(Some(-4))?;
    conn.roll_back(Some(3))?;

    assert_eq!(conn.transaction_level(), 2);
    assert_eq!(conn.handle().calls.len(), calls_before);
    Ok(())
}

#[test]
fn rollback_while_idle_is_a_no_op() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.roll_back(None)?;
    conn.roll_back(Some(0))?;
    assert_eq!(conn.transaction_level(), 0);
    assert!(conn.handle().calls.is_empty());
    Ok(())
}

#[test]
fn explicit_level_zero_issues_a_full_rollback() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.begin_transaction()?;
    conn.begin_transaction()?;

    conn.roll_back(Some(0))?;
    assert_eq!(conn.transaction_level(), 0);
    assert_eq!(conn.handle().full_rollbacks(), 1);
    Ok(())
}

#[test]
fn rollback_to_an_inner_level_drops_to_just_below_it()
-> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    for _ in 0..3 {
        conn.begin_transaction()?;
    }

    conn.roll_back(Some(2))?;
    assert_eq!(conn.transaction_level(), 1);
    assert_eq!(conn.handle().rollbacks_to("trans2"), 1);
    Ok(())
}
