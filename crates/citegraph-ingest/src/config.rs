//! Runtime configuration, deserialised from `citegraph.toml` and
//! `CITEGRAPH_*` environment variables. Every key has a default.

use std::{ops::RangeInclusive, path::PathBuf, time::Duration};

use citegraph_pubmed::ExtractOptions;
use serde::Deserialize;

use crate::{error::ConfigError, retrieve::RetryPolicy};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  /// Directory URL holding the archives and their manifests.
  pub source_base_url:   String,
  pub file_prefix:       String,
  /// Where decompressed documents are staged until they are parsed.
  pub staging_dir:       PathBuf,
  pub store_path:        PathBuf,
  /// Records per committed transaction.
  pub batch_size:        usize,
  /// Extra download attempts after a transport failure.
  pub retries:           u32,
  pub retry_delay_ms:    u64,
  pub http_timeout_secs: u64,
  /// Archives processed concurrently.
  pub workers:           usize,
  pub first_file:        u32,
  pub last_file:         u32,
  /// Reference `IdType`s kept as citations; empty keeps all.
  pub citation_id_types: Vec<String>,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      source_base_url:   "https://ftp.ncbi.nlm.nih.gov/pubmed/baseline/".into(),
      file_prefix:       "pubmed21n".into(),
      staging_dir:       PathBuf::from("data"),
      store_path:        PathBuf::from("citegraph.db"),
      batch_size:        10_000,
      retries:           0,
      retry_delay_ms:    1_000,
      http_timeout_secs: 300,
      workers:           1,
      first_file:        1,
      last_file:         1062,
      citation_id_types: Vec::new(),
    }
  }
}

impl IngestConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.batch_size == 0 {
      return Err(ConfigError::ZeroBatchSize);
    }
    if self.workers == 0 {
      return Err(ConfigError::ZeroWorkers);
    }
    if self.first_file > self.last_file {
      return Err(ConfigError::EmptyRange { first: self.first_file, last: self.last_file });
    }
    if self.file_prefix.is_empty() {
      return Err(ConfigError::EmptyPrefix);
    }
    Ok(())
  }

  pub fn file_range(&self) -> RangeInclusive<u32> { self.first_file..=self.last_file }

  pub fn http_timeout(&self) -> Duration { Duration::from_secs(self.http_timeout_secs) }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      retries: self.retries,
      delay:   Duration::from_millis(self.retry_delay_ms),
    }
  }

  pub fn extract_options(&self) -> ExtractOptions {
    ExtractOptions { citation_id_types: self.citation_id_types.clone() }
  }
}
