/// Query grammar: the small slice of dialect knowledge the adapter needs.
///
/// The query builder proper lives elsewhere; this only carries the table
/// prefix, the date format bindings are rendered with, and literal quoting.
#[derive(Debug, Clone, Default)]
pub struct QueryGrammar {
    table_prefix: String,
}

impl QueryGrammar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The prefix applied to every table this connection touches.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn set_table_prefix(&mut self, prefix: impl Into<String>) {
        self.table_prefix = prefix.into();
    }

    /// Format string used when rendering timestamp bindings as text.
    #[must_use]
    pub fn date_format(&self) -> &str {
        "%Y-%m-%d %H:%M:%S"
    }

    /// Wrap a table name with the configured prefix, backtick-quoted.
    #[must_use]
    pub fn wrap_table(&self, table: &str) -> String {
        format!("`{}{}`", self.table_prefix, table)
    }

    /// Render a string as a quoted SQL literal, doubling embedded quotes.
    #[must_use]
    pub fn quote_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for ch in value.chars() {
            if ch == '\'' {
                out.push_str("''");
            } else {
                out.push(ch);
            }
        }
        out.push('\'');
        out
    }
}

/// Schema grammar used by the metadata wrapper.
#[derive(Debug, Clone, Default)]
pub struct SchemaGrammar {
    table_prefix: String,
}

impl SchemaGrammar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn set_table_prefix(&mut self, prefix: impl Into<String>) {
        self.table_prefix = prefix.into();
    }

    /// Metadata query checking for a table's existence. The prefixed table
    /// name is bound as the single `?` placeholder.
    #[must_use]
    pub fn compile_table_exists(&self) -> &str {
        "select name from sqlite_master where type = 'table' and name = ?"
    }

    /// Metadata query listing a table's columns.
    #[must_use]
    pub fn compile_column_listing(&self, table: &str) -> String {
        format!("pragma table_info(`{}{}`)", self.table_prefix, table)
    }
}

/// Post-processor applied to results coming back from the handle.
///
/// The adapter returns results unchanged; this is a seam an ORM layer can
/// override, so both hooks are identity functions here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessor;

impl PostProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hook for select results; identity here.
    #[must_use]
    pub fn process_select(&self, rows: Vec<crate::row::Row>) -> Vec<crate::row::Row> {
        rows
    }

    /// Hook for insert-and-return-id flows; identity here.
    #[must_use]
    pub fn process_insert_id(&self, id: i64) -> i64 {
        id
    }
}
