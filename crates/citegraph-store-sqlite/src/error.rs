//! Error type for `citegraph-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] citegraph_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The label is already keyed by a different property.
  #[error("label {label} is unique on {existing}, not {requested}")]
  ConstraintConflict {
    label:     String,
    existing:  String,
    requested: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
