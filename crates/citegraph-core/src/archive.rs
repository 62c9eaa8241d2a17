//! Archive numbering and the handle to a decoded archive on local disk.

use std::{
  fmt,
  io,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

// ─── ArchiveNumber ───────────────────────────────────────────────────────────

/// The sequence number of one source archive, rendered zero-padded to four
/// digits in file names (`pubmed21n0007.xml.gz`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ArchiveNumber(pub u32);

impl ArchiveNumber {
  /// Name of the compressed data artifact, e.g. `pubmed21n0007.xml.gz`.
  pub fn data_file_name(self, prefix: &str) -> String {
    format!("{prefix}{self}.xml.gz")
  }

  /// Name of the checksum manifest published next to the data artifact.
  pub fn manifest_file_name(self, prefix: &str) -> String {
    format!("{}.md5", self.data_file_name(prefix))
  }

  /// Name of the decompressed document in the staging directory.
  pub fn document_file_name(self, prefix: &str) -> String {
    format!("{prefix}{self}.xml")
  }
}

impl fmt::Display for ArchiveNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}", self.0)
  }
}

impl From<u32> for ArchiveNumber {
  fn from(n: u32) -> Self { Self(n) }
}

// ─── DecodedArchive ──────────────────────────────────────────────────────────

/// A verified, decompressed archive document sitting in the staging
/// directory.
///
/// The handle owns the file: it is deleted by [`DecodedArchive::remove`] or,
/// failing that, when the handle is dropped.
#[derive(Debug)]
pub struct DecodedArchive {
  number:  ArchiveNumber,
  path:    PathBuf,
  removed: bool,
}

impl DecodedArchive {
  pub fn new(number: ArchiveNumber, path: impl Into<PathBuf>) -> Self {
    Self { number, path: path.into(), removed: false }
  }

  pub fn number(&self) -> ArchiveNumber { self.number }

  pub fn path(&self) -> &Path { &self.path }

  /// Delete the document now, surfacing any IO error.
  pub fn remove(mut self) -> io::Result<()> {
    self.removed = true;
    match std::fs::remove_file(&self.path) {
      Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
      _ => Ok(()),
    }
  }
}

impl Drop for DecodedArchive {
  fn drop(&mut self) {
    if !self.removed {
      let _ = std::fs::remove_file(&self.path);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_names_are_zero_padded() {
    let n = ArchiveNumber(7);
    assert_eq!(n.data_file_name("pubmed21n"), "pubmed21n0007.xml.gz");
    assert_eq!(n.manifest_file_name("pubmed21n"), "pubmed21n0007.xml.gz.md5");
    assert_eq!(n.document_file_name("pubmed21n"), "pubmed21n0007.xml");
    assert_eq!(ArchiveNumber(1062).to_string(), "1062");
  }

  #[test]
  fn dropping_the_handle_deletes_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.xml");
    std::fs::write(&path, "<x/>").unwrap();

    drop(DecodedArchive::new(ArchiveNumber(1), &path));
    assert!(!path.exists());
  }

  #[test]
  fn remove_tolerates_an_already_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let handle = DecodedArchive::new(ArchiveNumber(1), dir.path().join("gone.xml"));
    handle.remove().unwrap();
  }
}
