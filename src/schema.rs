use crate::connection::Connection;
use crate::error::SqlConduitError;
use crate::handle::RawHandle;
use crate::value::SqlValue;

/// Thin schema-introspection wrapper over a [`Connection`].
///
/// Issues metadata queries through the same execution path as everything
/// else; holds no state of its own.
pub struct SchemaBuilder<'c, H: RawHandle> {
    conn: &'c mut Connection<H>,
}

impl<'c, H: RawHandle> SchemaBuilder<'c, H> {
    pub(crate) fn new(conn: &'c mut Connection<H>) -> Self {
        Self { conn }
    }

    /// Whether a table (with the connection's prefix applied) exists.
    ///
    /// # Errors
    /// Propagates query failures from the metadata statement.
    pub fn has_table(&mut self, table: &str) -> Result<bool, SqlConduitError> {
        let sql = self.conn.schema_grammar().compile_table_exists().to_string();
        let prefixed = format!("{}{}", self.conn.table_prefix(), table);
        let rows = self.conn.select(&sql, &[SqlValue::Text(prefixed)])?;
        Ok(!rows.is_empty())
    }

    /// Column names of a table, in declaration order.
    ///
    /// # Errors
    /// Propagates query failures from the metadata statement.
    pub fn column_listing(&mut self, table: &str) -> Result<Vec<String>, SqlConduitError> {
        let sql = self.conn.schema_grammar().compile_column_listing(table);
        let rows = self.conn.select(&sql, &[])?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(|v| v.as_text()).map(String::from))
            .collect())
    }

    /// Whether a table has the given column (case-insensitive).
    ///
    /// # Errors
    /// Propagates query failures from the metadata statement.
    pub fn has_column(&mut self, table: &str, column: &str) -> Result<bool, SqlConduitError> {
        let wanted = column.to_lowercase();
        Ok(self
            .column_listing(table)?
            .iter()
            .any(|name| name.to_lowercase() == wanted))
    }
}
