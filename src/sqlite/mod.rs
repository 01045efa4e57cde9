//! `SQLite` backend: a [`crate::handle::RawHandle`] over `rusqlite` that
//! reproduces the legacy side-channel contract (failure sentinels plus a
//! last-error string) the adapter is built against.

mod handle;
mod query;

pub use handle::SqliteHandle;
pub use query::collect_rows;
