use crate::value::SqlValue;

/// One executed (or pretended) statement, as recorded in the query log.
///
/// Entries are append-only; the log is cleared only through
/// [`crate::Connection::flush_query_log`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLogEntry {
    /// The literal SQL sent (or that would have been sent, in pretend mode).
    pub sql: String,
    /// The caller's bindings, pre-sanitization.
    pub bindings: Vec<SqlValue>,
    /// Wall-clock elapsed time in fractional seconds.
    pub elapsed_secs: f64,
}
