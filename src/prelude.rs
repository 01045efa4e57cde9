//! Convenient imports for common functionality.

pub use crate::bindings::{interpolate, prepare_bindings, quote_value};
pub use crate::classify::{
    CONCURRENCY_ERROR_SIGNATURES, ConcurrencyClassifier, DefaultConcurrencySignatures,
};
pub use crate::config::ConnectionConfig;
pub use crate::connection::Connection;
pub use crate::error::SqlConduitError;
pub use crate::grammar::{PostProcessor, QueryGrammar, SchemaGrammar};
pub use crate::handle::RawHandle;
pub use crate::log::QueryLogEntry;
pub use crate::row::Row;
pub use crate::value::{Expression, QueryAndBindings, SqlValue};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteHandle;
