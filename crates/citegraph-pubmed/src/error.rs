//! Error types for the PubMed archive reader.
//!
//! Only conditions that stop the document itself from being read are errors.
//! Missing or malformed fields inside an entry degrade to defaults instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("xml error at byte {position}: {source}")]
  Xml {
    position: u64,
    #[source]
    source:   quick_xml::Error,
  },

  #[error("malformed document: {0}")]
  MalformedDocument(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
