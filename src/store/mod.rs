//! Persistence layer: libSQL-backed settings and project records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, StoredProject};
