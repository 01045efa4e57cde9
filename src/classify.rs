/// Pluggable strategy that decides whether a failure message describes a
/// transient concurrency conflict (deadlock, lock wait, table lock).
///
/// The retry loop in the transaction driver treats any message matched here
/// as retry-safe, so alternate drivers can supply their own signature list
/// without touching the state machine.
pub trait ConcurrencyClassifier {
    fn is_concurrency_error(&self, message: &str) -> bool;
}

/// Fixed substring signatures of concurrency conflicts.
///
/// Matching is case-sensitive substring membership; the list is the oracle
/// the retry loop depends on and must not be paraphrased.
pub const CONCURRENCY_ERROR_SIGNATURES: [&str; 9] = [
    "Deadlock found when trying to get lock",
    "deadlock detected",
    "The database file is locked",
    "database is locked",
    "database table is locked",
    "A table in the database is locked",
    "has been chosen as the deadlock victim",
    "Lock wait timeout exceeded",
    "WSREP detected deadlock/conflict and aborted the transaction. Try restarting the transaction",
];

/// Default classifier backed by [`CONCURRENCY_ERROR_SIGNATURES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConcurrencySignatures;

impl ConcurrencyClassifier for DefaultConcurrencySignatures {
    fn is_concurrency_error(&self, message: &str) -> bool {
        CONCURRENCY_ERROR_SIGNATURES
            .iter()
            .any(|sig| message.contains(sig))
    }
}
