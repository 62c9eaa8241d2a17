//! SQLite backend for the citegraph destination graph.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod schema;
mod store;
mod transaction;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
pub use transaction::SqliteTransaction;
