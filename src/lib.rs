//! Synchronous connection adapter for driving a legacy database handle from
//! a query builder.
//!
//! The handle this crate wraps has no prepared-statement protocol, no
//! structured errors, and no native savepoint API; it runs fully
//! interpolated SQL text and reports failure through a side-channel error
//! string. `sql-conduit` layers the contract a relational query builder
//! expects on top of that: sanitized bindings, a timed and logged primitive
//! executor, nested transactions mapped onto named savepoints, and a
//! bounded retry loop for work units that hit concurrency conflicts.
//!
//! ```rust
//! use sql_conduit::prelude::*;
//!
//! # fn demo() -> Result<(), SqlConduitError> {
//! let handle = SqliteHandle::open_in_memory()?;
//! let mut conn = Connection::new(handle, ConnectionConfig::new("demo"));
//!
//! conn.unprepared("CREATE TABLE t (id INTEGER, name TEXT)")?;
//! let inserted = conn.transaction(
//!     |c| c.insert("insert into t (id, name) values (?, ?)",
//!                  &[SqlValue::Int(1), SqlValue::Text("alice".into())]),
//!     3,
//! )?;
//! assert!(inserted);
//! # Ok(()) }
//! ```

pub mod bindings;
pub mod classify;
pub mod config;
pub mod connection;
pub mod error;
pub mod grammar;
pub mod handle;
pub mod log;
pub mod prelude;
pub mod row;
pub mod schema;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use connection::Connection;
pub use error::SqlConduitError;
