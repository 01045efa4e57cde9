mod executor;
mod transaction;

use serde_json::Value as JsonValue;

use crate::bindings::{interpolate, prepare_bindings};
use crate::classify::{ConcurrencyClassifier, DefaultConcurrencySignatures};
use crate::config::ConnectionConfig;
use crate::error::SqlConduitError;
use crate::grammar::{PostProcessor, QueryGrammar, SchemaGrammar};
use crate::handle::RawHandle;
use crate::log::QueryLogEntry;
use crate::row::Row;
use crate::schema::SchemaBuilder;
use crate::value::{Expression, SqlValue};

/// The connection object the query builder talks to.
///
/// Composes the primitive executor, binding sanitizer, error classifier, and
/// the transaction/savepoint state machine over a [`RawHandle`]. The systems
/// this adapter targets run one logical connection for the whole process:
/// build the `Connection` once at startup and pass it by reference to every
/// collaborator rather than reaching for a hidden global. Construction is
/// cheap and deterministic, so tests that depend on identity can hold their
/// own instance.
pub struct Connection<H: RawHandle> {
    pub(crate) handle: H,
    config: ConnectionConfig,
    query_grammar: QueryGrammar,
    schema_grammar: SchemaGrammar,
    post_processor: PostProcessor,
    pub(crate) classifier: Box<dyn ConcurrencyClassifier + Send>,
    /// Nested transaction depth; 0 exactly when no transaction is open.
    pub(crate) transactions: usize,
    pub(crate) query_log: Vec<QueryLogEntry>,
    pub(crate) logging: bool,
    pub(crate) pretending: bool,
}

impl<H: RawHandle> Connection<H> {
    /// Build a connection over `handle`, applying the configured table
    /// prefix to both grammars.
    #[must_use]
    pub fn new(handle: H, config: ConnectionConfig) -> Self {
        let mut query_grammar = QueryGrammar::new();
        query_grammar.set_table_prefix(&config.table_prefix);
        let mut schema_grammar = SchemaGrammar::new();
        schema_grammar.set_table_prefix(&config.table_prefix);

        Self {
            handle,
            config,
            query_grammar,
            schema_grammar,
            post_processor: PostProcessor::new(),
            classifier: Box::new(DefaultConcurrencySignatures),
            transactions: 0,
            query_log: Vec::new(),
            logging: false,
            pretending: false,
        }
    }

    /// Swap in a driver-specific concurrency classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn ConcurrencyClassifier + Send>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run a SELECT and return all rows.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn select(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<Vec<Row>, SqlConduitError> {
        let statement = interpolate(&self.query_grammar, sql, bindings);
        let rows = self.run_select(&statement, bindings)?;
        Ok(self.post_processor.process_select(rows))
    }

    /// Run a SELECT and return only the first row, if any.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn select_one(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<Option<Row>, SqlConduitError> {
        Ok(self.select(sql, bindings)?.into_iter().next())
    }

    /// Run a SELECT and iterate its rows.
    ///
    /// Known limitation: the underlying handle has no incremental-fetch
    /// protocol, so this materializes the full result set and iterates it;
    /// it is an alias for [`Connection::select`], not a streaming cursor.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn cursor(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<std::vec::IntoIter<Row>, SqlConduitError> {
        Ok(self.select(sql, bindings)?.into_iter())
    }

    /// Run an INSERT statement.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn insert(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<bool, SqlConduitError> {
        self.statement(sql, bindings)
    }

    /// Run an UPDATE statement, returning the affected-row count.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn update(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<u64, SqlConduitError> {
        self.affecting_statement(sql, bindings)
    }

    /// Run a DELETE statement, returning the affected-row count.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn delete(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<u64, SqlConduitError> {
        self.affecting_statement(sql, bindings)
    }

    /// Run a statement where only success matters.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn statement(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<bool, SqlConduitError> {
        let statement = interpolate(&self.query_grammar, sql, bindings);
        self.run_statement(&statement, bindings)
    }

    /// Run a DML statement, returning the affected-row count.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn affecting_statement(
        &mut self,
        sql: &str,
        bindings: &[SqlValue],
    ) -> Result<u64, SqlConduitError> {
        let statement = interpolate(&self.query_grammar, sql, bindings);
        self.run_affecting(&statement, bindings)
    }

    /// Run raw SQL with no binding handling at all.
    ///
    /// # Errors
    /// Returns [`SqlConduitError::Query`] when the handle reports failure.
    pub fn unprepared(&mut self, sql: &str) -> Result<bool, SqlConduitError> {
        self.run_statement(sql, &[])
    }

    /// Wrap a fragment so the query builder splices it in verbatim.
    #[must_use]
    pub fn raw(&self, value: impl Into<String>) -> Expression {
        Expression::new(value)
    }

    /// Sanitize bindings the way execution would, without running anything.
    #[must_use]
    pub fn prepare_bindings(&self, bindings: &[SqlValue]) -> Vec<SqlValue> {
        prepare_bindings(&self.query_grammar, bindings)
    }

    /// Execute `callback` in pretend mode: statements are logged with timing
    /// but never reach the handle, and each primitive returns its empty
    /// identity. Prior pretend/logging state and the prior query log are
    /// restored afterward; the log entries accumulated inside the span are
    /// returned.
    ///
    /// # Errors
    /// Propagates whatever `callback` returns; the executor itself cannot
    /// fail while pretending.
    pub fn pretend<F>(&mut self, callback: F) -> Result<Vec<QueryLogEntry>, SqlConduitError>
    where
        F: FnOnce(&mut Self) -> Result<(), SqlConduitError>,
    {
        let prior_pretending = self.pretending;
        let prior_logging = self.logging;
        let prior_log = std::mem::take(&mut self.query_log);
        self.pretending = true;
        self.logging = true;

        let result = callback(self);

        let span_log = std::mem::replace(&mut self.query_log, prior_log);
        self.pretending = prior_pretending;
        self.logging = prior_logging;

        result.map(|()| span_log)
    }

    /// Whether pretend mode is currently active.
    #[must_use]
    pub fn pretending(&self) -> bool {
        self.pretending
    }

    /// Look up a connection-config value.
    #[must_use]
    pub fn get_config(&self, key: &str) -> Option<JsonValue> {
        self.config.get(key)
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn query_grammar(&self) -> &QueryGrammar {
        &self.query_grammar
    }

    #[must_use]
    pub fn schema_grammar(&self) -> &SchemaGrammar {
        &self.schema_grammar
    }

    #[must_use]
    pub fn post_processor(&self) -> &PostProcessor {
        &self.post_processor
    }

    /// Schema-introspection wrapper bound to this connection.
    pub fn schema_builder(&mut self) -> SchemaBuilder<'_, H> {
        SchemaBuilder::new(self)
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        self.query_grammar.table_prefix()
    }

    /// Start recording executed statements in the query log.
    pub fn enable_query_log(&mut self) {
        self.logging = true;
    }

    pub fn disable_query_log(&mut self) {
        self.logging = false;
    }

    /// Whether the query log is recording.
    #[must_use]
    pub fn logging(&self) -> bool {
        self.logging
    }

    /// The recorded query log, oldest first.
    #[must_use]
    pub fn query_log(&self) -> &[QueryLogEntry] {
        &self.query_log
    }

    /// Clear the query log.
    pub fn flush_query_log(&mut self) {
        self.query_log.clear();
    }

    /// Borrow the underlying handle.
    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Mutably borrow the underlying handle.
    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    /// Tear down the facade and recover the handle.
    #[must_use]
    pub fn into_handle(self) -> H {
        self.handle
    }
}
