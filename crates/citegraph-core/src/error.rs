//! Error types for `citegraph-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("article id is empty")]
  EmptyArticleId,

  #[error("article id is negative: {0:?}")]
  NegativeArticleId(String),

  #[error("article id is not an integer: {0:?}")]
  NonNumericArticleId(String),

  #[error("invalid graph identifier: {0:?}")]
  InvalidIdentifier(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
