//! Error types for the ingestion stages.
//!
//! Parsing failures are `citegraph_pubmed::Error`; retrieval and loading
//! failures live here. The orchestrator turns all of them into an
//! [`IngestFailure`](citegraph_core::report::IngestFailure) for the report.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to obtain a trustworthy local copy of an archive.
#[derive(Debug, Error)]
pub enum RetrievalError {
  #[error("request for {url} failed: {source}")]
  Transport {
    url:    String,
    #[source]
    source: BoxError,
  },

  #[error("{url} answered with HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed checksum manifest: {0:?}")]
  MalformedManifest(String),

  #[error("checksum manifest describes {found}, expected {expected}")]
  ManifestMismatch { expected: String, found: String },

  #[error("unsupported checksum algorithm: {0}")]
  UnsupportedAlgorithm(String),

  /// The downloaded bytes do not hash to the published digest. The artifact
  /// must not be trusted.
  #[error("checksum does not match (expected {expected}, got {actual})")]
  Integrity { expected: String, actual: String },

  #[error("decompression failed: {0}")]
  Decompress(#[source] std::io::Error),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl RetrievalError {
  pub fn is_integrity(&self) -> bool { matches!(self, Self::Integrity { .. }) }
}

/// A destination-store failure during a file's load.
///
/// Batches committed before the failure stay in the store; the failed batch
/// is discarded.
#[derive(Debug, Error)]
#[error("batch {batch} failed after {committed} committed batch(es): {source}")]
pub struct LoadError {
  /// Zero-based index of the batch that failed.
  pub batch:     usize,
  pub committed: usize,
  #[source]
  pub source:    BoxError,
}

impl LoadError {
  pub(crate) fn new(
    batch: usize,
    committed: usize,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self { batch, committed, source: Box::new(source) }
  }
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("batch_size must be at least 1")]
  ZeroBatchSize,

  #[error("workers must be at least 1")]
  ZeroWorkers,

  #[error("empty file range: first_file {first} > last_file {last}")]
  EmptyRange { first: u32, last: u32 },

  #[error("file_prefix must not be empty")]
  EmptyPrefix,
}
