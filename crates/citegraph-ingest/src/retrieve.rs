//! Archive retrieval: download, verify against the published checksum, and
//! decompress into the staging directory.
//!
//! Nothing unverified is ever decompressed, and a failed decompression
//! leaves no partial document behind: output goes to `<name>.xml.part`
//! first and is renamed into place only once complete.

use std::{
  fs::File,
  io::{self, BufWriter, Write as _},
  path::PathBuf,
  time::Duration,
};

use bytes::Bytes;
use citegraph_core::archive::{ArchiveNumber, DecodedArchive};
use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use crate::{
  checksum::Manifest,
  config::IngestConfig,
  error::RetrievalError,
  transport::{Transport, join_url},
};

/// How often a failed download is attempted again.
///
/// Only transient failures (connection errors, timeouts, 5xx and 429
/// answers) are retried. Checksum mismatches never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub retries: u32,
  pub delay:   Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { retries: 0, delay: Duration::from_secs(1) } }
}

impl RetrievalError {
  fn is_transient(&self) -> bool {
    match self {
      Self::Transport { .. } => true,
      Self::Status { status, .. } => *status >= 500 || *status == 429,
      _ => false,
    }
  }
}

// ─── Retriever ───────────────────────────────────────────────────────────────

pub struct Retriever<T> {
  transport:   T,
  base_url:    String,
  prefix:      String,
  staging_dir: PathBuf,
  retry:       RetryPolicy,
}

impl<T: Transport> Retriever<T> {
  pub fn new(transport: T, config: &IngestConfig) -> Self {
    Self {
      transport,
      base_url: config.source_base_url.clone(),
      prefix: config.file_prefix.clone(),
      staging_dir: config.staging_dir.clone(),
      retry: config.retry_policy(),
    }
  }

  /// Obtain a verified, decompressed copy of archive `number`.
  ///
  /// The returned [`DecodedArchive`] owns the staged document and deletes it
  /// when dropped.
  pub async fn fetch(&self, number: ArchiveNumber) -> Result<DecodedArchive, RetrievalError> {
    let result = self.fetch_verified(number).await;
    if let Err(error) = &result {
      warn!(file_number = %number, %error, "download failed");
    }
    result
  }

  async fn fetch_verified(
    &self,
    number: ArchiveNumber,
  ) -> Result<DecodedArchive, RetrievalError> {
    let data_name    = number.data_file_name(&self.prefix);
    let data_url     = join_url(&self.base_url, &data_name);
    let manifest_url = join_url(&self.base_url, &number.manifest_file_name(&self.prefix));

    info!(file_number = %number, url = %data_url, "download started");

    let manifest = self.download(&manifest_url).await?;
    let manifest = Manifest::parse(&String::from_utf8_lossy(&manifest))?;
    if let Some(found) = &manifest.file_name
      && *found != data_name
    {
      return Err(RetrievalError::ManifestMismatch { expected: data_name, found: found.clone() });
    }
    let data = self.download(&data_url).await?;
    manifest.verify(&data)?;
    info!(
      file_number = %number,
      algorithm = ?manifest.algorithm,
      bytes = data.len(),
      "checksum verified"
    );

    tokio::fs::create_dir_all(&self.staging_dir).await?;
    let target = self.staging_dir.join(number.document_file_name(&self.prefix));
    let path = tokio::task::spawn_blocking(move || decompress(&data, target)).await??;
    debug!(file_number = %number, path = %path.display(), "document staged");

    Ok(DecodedArchive::new(number, path))
  }

  async fn download(&self, url: &str) -> Result<Bytes, RetrievalError> {
    let mut attempt = 0;
    loop {
      match self.transport.get(url).await {
        Ok(body) => return Ok(body),
        Err(error) if attempt < self.retry.retries && error.is_transient() => {
          attempt += 1;
          warn!(%url, attempt, %error, "download attempt failed, retrying");
          tokio::time::sleep(self.retry.delay).await;
        }
        Err(error) => return Err(error),
      }
    }
  }
}

// ─── Decompression ───────────────────────────────────────────────────────────

/// Removes a partially written file unless [`keep`](Self::keep) is called.
struct PartialFile {
  path:  PathBuf,
  armed: bool,
}

impl PartialFile {
  fn new(path: PathBuf) -> Self { Self { path, armed: true } }

  fn keep(mut self) { self.armed = false; }
}

impl Drop for PartialFile {
  fn drop(&mut self) {
    if self.armed {
      let _ = std::fs::remove_file(&self.path);
    }
  }
}

fn decompress(data: &[u8], target: PathBuf) -> Result<PathBuf, RetrievalError> {
  let partial = PartialFile::new(target.with_extension("xml.part"));

  let mut out = BufWriter::new(File::create(&partial.path)?);
  io::copy(&mut GzDecoder::new(data), &mut out).map_err(RetrievalError::Decompress)?;
  out.flush()?;
  drop(out);

  std::fs::rename(&partial.path, &target)?;
  partial.keep();
  Ok(target)
}
