use std::sync::Arc;

use rusqlite::types::Value;

use crate::row::Row;
use crate::value::SqlValue;

/// Extract one [`SqlValue`] from a `SQLite` row.
///
/// # Errors
/// Returns `rusqlite::Error` if the value cannot be read.
pub(crate) fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<SqlValue, rusqlite::Error> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    })
}

/// Run a query and materialize every row, sharing the column-name list
/// across rows.
///
/// # Errors
/// Returns `rusqlite::Error` if preparation, execution, or value extraction
/// fails.
pub fn collect_rows(conn: &rusqlite::Connection, sql: &str) -> Result<Vec<Row>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let shared = Arc::new(column_names);

    let mut rows = Vec::new();
    let mut iter = stmt.query([])?;
    while let Some(raw) = iter.next()? {
        let mut values = Vec::with_capacity(shared.len());
        for i in 0..shared.len() {
            values.push(extract_value(raw, i)?);
        }
        rows.push(Row::new(shared.clone(), values));
    }

    Ok(rows)
}
