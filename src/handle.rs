use crate::row::Row;

/// The adapter interface over a legacy database handle.
///
/// The handle this crate wraps has no prepared-statement protocol and no
/// structured errors: statements arrive as fully interpolated SQL text, and
/// failure is signalled through a sentinel return value plus a side-channel
/// error string. Every capability the connection delegates to the handle is
/// enumerated here explicitly; there is no dynamic passthrough.
///
/// Failure contract: a call failed iff it returned its failure sentinel
/// (`None`/`false`) or [`RawHandle::last_error`] is non-empty afterward.
/// Implementations are expected to clear the error slot at the start of each
/// statement-running call.
pub trait RawHandle {
    /// Run a query and return its full row set, or `None` on failure.
    fn query_rows(&mut self, sql: &str) -> Option<Vec<Row>>;

    /// Run an INSERT/UPDATE/DELETE and return the affected-row count,
    /// or `None` on failure.
    fn query_affected(&mut self, sql: &str) -> Option<u64>;

    /// Run a statement where only success/failure matters.
    fn query_ok(&mut self, sql: &str) -> bool;

    /// Open a root transaction.
    fn start_transaction(&mut self) -> bool;

    /// Commit the open transaction.
    fn commit_transaction(&mut self) -> bool;

    /// Roll back to a named savepoint, or fully when `savepoint` is `None`.
    fn rollback_transaction(&mut self, savepoint: Option<&str>) -> bool;

    /// Establish a named savepoint inside the open transaction.
    fn create_savepoint(&mut self, name: &str) -> bool;

    /// The side-channel error text from the most recent call, if any.
    /// An empty string counts as "no error".
    fn last_error(&self) -> Option<String>;

    /// Whether the most recent failure severed the session.
    fn connection_lost(&self) -> bool;

    /// Attempt to re-establish a severed session. Returns true when the
    /// handle is connected afterward.
    fn reconnect(&mut self) -> bool;
}

/// True when the handle reports a real (non-empty) side-channel error.
pub(crate) fn has_pending_error<H: RawHandle + ?Sized>(handle: &H) -> bool {
    handle.last_error().is_some_and(|e| !e.is_empty())
}
