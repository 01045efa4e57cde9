//! Pretend mode: statements are logged with timing but never reach the
//! handle, primitives return their empty identity, and prior state is
//! restored when the span ends.

use sql_conduit::config::ConnectionConfig;
use sql_conduit::connection::Connection;
use sql_conduit::test_utils::RecordingHandle;
use sql_conduit::value::SqlValue;

fn conn() -> Connection<RecordingHandle> {
    Connection::new(RecordingHandle::new(), ConnectionConfig::new("test"))
}

#[test]
fn pretended_selects_never_reach_the_handle() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();

    let log = conn.pretend(|c| {
        let first = c.select("select * from t where id = ?", &[SqlValue::Int(1)])?;
        assert!(first.is_empty());
        let second = c.select("select count(*) from t", &[])?;
        assert!(second.is_empty());
        Ok(())
    })?;

    assert_eq!(conn.handle().query_count(), 0);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].sql, "select * from t where id = 1");
    assert_eq!(log[0].bindings, vec![SqlValue::Int(1)]);
    assert_eq!(log[1].sql, "select count(*) from t");
    assert!(log[1].bindings.is_empty());
    assert!(log.iter().all(|entry| entry.elapsed_secs >= 0.0));
    Ok(())
}

#[test]
fn pretended_dml_returns_empty_identities() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();

    conn.pretend(|c| {
        assert!(c.insert("insert into t values (?)", &[SqlValue::Int(1)])?);
        assert_eq!(c.update("update t set a = ?", &[SqlValue::Int(2)])?, 0);
        assert_eq!(c.delete("delete from t", &[])?, 0);
        Ok(())
    })?;

    assert_eq!(conn.handle().query_count(), 0);
    Ok(())
}

#[test]
fn pretend_restores_prior_logging_state() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    assert!(!conn.logging());

    conn.pretend(|c| {
        assert!(c.pretending());
        assert!(c.logging());
        c.select("select 1", &[]).map(|_| ())
    })?;

    assert!(!conn.pretending());
    assert!(!conn.logging());
    assert!(conn.query_log().is_empty());
    Ok(())
}

#[test]
fn pretend_keeps_the_outer_query_log_intact() -> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();
    conn.enable_query_log();
    conn.select("select 'before'", &[])?;

    let span = conn.pretend(|c| c.select("select 'inside'", &[]).map(|_| ()))?;

    assert_eq!(span.len(), 1);
    assert_eq!(span[0].sql, "select 'inside'");
    // The outer log holds only the real statement.
    assert_eq!(conn.query_log().len(), 1);
    assert_eq!(conn.query_log()[0].sql, "select 'before'");
    assert!(conn.logging());
    Ok(())
}

#[test]
fn pretend_propagates_closure_errors_but_still_restores()
-> Result<(), sql_conduit::SqlConduitError> {
    let mut conn = conn();

    let result = conn.pretend(|_c| {
        Err(sql_conduit::SqlConduitError::Other("aborted".to_string()))
    });

    assert!(result.is_err());
    assert!(!conn.pretending());
    assert!(!conn.logging());
    Ok(())
}
