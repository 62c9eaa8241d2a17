//! Checksum manifests published next to each archive.
//!
//! A manifest is a single line in the BSD `tag` layout the mirror uses:
//!
//! ```text
//! MD5(pubmed21n0001.xml.gz)= 0123456789abcdef0123456789abcdef
//! ```
//!
//! The digest is the text after the first `"= "`. MD5 and SHA-256 manifests
//! are understood; the comparison is over lowercase hex.

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::error::RetrievalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
  Md5,
  Sha256,
}

impl Algorithm {
  fn from_tag(tag: &str) -> Result<Self, RetrievalError> {
    match tag.trim().to_ascii_uppercase().as_str() {
      "MD5" => Ok(Self::Md5),
      "SHA256" | "SHA-256" | "SHA2-256" => Ok(Self::Sha256),
      other => Err(RetrievalError::UnsupportedAlgorithm(other.to_owned())),
    }
  }

  fn digest_len(self) -> usize {
    match self {
      Self::Md5 => 32,
      Self::Sha256 => 64,
    }
  }

  /// Lowercase hex digest of `data`.
  pub fn hex_digest(self, data: &[u8]) -> String {
    match self {
      Self::Md5 => hex::encode(Md5::digest(data)),
      Self::Sha256 => hex::encode(Sha256::digest(data)),
    }
  }
}

/// A parsed checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
  pub algorithm: Algorithm,
  /// The file name inside the parentheses, when present.
  pub file_name: Option<String>,
  /// Expected digest, lowercase hex.
  pub digest:    String,
}

impl Manifest {
  pub fn parse(text: &str) -> Result<Self, RetrievalError> {
    let malformed = || RetrievalError::MalformedManifest(text.trim().to_owned());

    let line = text
      .lines()
      .map(str::trim)
      .find(|l| !l.is_empty())
      .ok_or_else(malformed)?;
    let (head, digest) = line.split_once("= ").ok_or_else(malformed)?;

    let (algorithm, file_name) = match head.split_once('(') {
      Some((tag, rest)) => {
        let name = rest.strip_suffix(')').ok_or_else(malformed)?;
        (Algorithm::from_tag(tag)?, Some(name.to_owned()))
      }
      None => (Algorithm::from_tag(head)?, None),
    };

    let digest = digest.trim().to_ascii_lowercase();
    if digest.len() != algorithm.digest_len()
      || !digest.bytes().all(|b| b.is_ascii_hexdigit())
    {
      return Err(malformed());
    }

    Ok(Self { algorithm, file_name, digest })
  }

  /// Fail with [`RetrievalError::Integrity`] unless `data` hashes to the
  /// manifest's digest.
  pub fn verify(&self, data: &[u8]) -> Result<(), RetrievalError> {
    let actual = self.algorithm.hex_digest(data);
    if actual != self.digest {
      return Err(RetrievalError::Integrity { expected: self.digest.clone(), actual });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // md5("hello world")
  const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

  #[test]
  fn parses_mirror_manifest() {
    let m = Manifest::parse(&format!("MD5(pubmed21n0001.xml.gz)= {HELLO_MD5}\n")).unwrap();
    assert_eq!(m.algorithm, Algorithm::Md5);
    assert_eq!(m.file_name.as_deref(), Some("pubmed21n0001.xml.gz"));
    assert_eq!(m.digest, HELLO_MD5);
  }

  #[test]
  fn digest_is_case_insensitive() {
    let m = Manifest::parse(&format!("md5(x)= {}", HELLO_MD5.to_uppercase())).unwrap();
    assert_eq!(m.digest, HELLO_MD5);
    m.verify(b"hello world").unwrap();
  }

  #[test]
  fn sha256_manifest() {
    let digest = Algorithm::Sha256.hex_digest(b"hello world");
    let m = Manifest::parse(&format!("SHA256(a.xml.gz)= {digest}")).unwrap();
    assert_eq!(m.algorithm, Algorithm::Sha256);
    m.verify(b"hello world").unwrap();
  }

  #[test]
  fn mismatch_is_an_integrity_error() {
    let m = Manifest::parse(&format!("MD5(x)= {HELLO_MD5}")).unwrap();
    let err = m.verify(b"hello world!").unwrap_err();
    assert!(err.is_integrity());
  }

  #[test]
  fn rejects_malformed_manifests() {
    for text in ["", "   \n", "no separator here", "MD5(x= abc", "MD5(x)= nothex!"] {
      assert!(
        matches!(Manifest::parse(text), Err(RetrievalError::MalformedManifest(_))),
        "{text:?}"
      );
    }
  }

  #[test]
  fn rejects_truncated_digest() {
    let err = Manifest::parse("MD5(x)= 5eb63bbb").unwrap_err();
    assert!(matches!(err, RetrievalError::MalformedManifest(_)));
  }

  #[test]
  fn rejects_unknown_algorithms() {
    let err = Manifest::parse("CRC32(x)= deadbeef").unwrap_err();
    assert!(matches!(err, RetrievalError::UnsupportedAlgorithm(a) if a == "CRC32"));
  }
}
