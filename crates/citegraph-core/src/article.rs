//! Article records, the unit produced by extraction and consumed by loading.
//!
//! A record is keyed by its citation-system identifier. Every other attribute
//! is descriptive and degrades to an empty default when the source omits it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── ArticleId ───────────────────────────────────────────────────────────────

/// A validated citation-system identifier: a non-empty string of ASCII digits.
///
/// Surrounding whitespace is trimmed. Leading zeros are preserved, so `"0100"`
/// and `"100"` are distinct keys.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ArticleId(String);

impl ArticleId {
  pub fn parse(raw: &str) -> Result<Self> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(Error::EmptyArticleId);
    }
    if let Some(rest) = trimmed.strip_prefix('-')
      && !rest.is_empty()
      && rest.bytes().all(|b| b.is_ascii_digit())
    {
      return Err(Error::NegativeArticleId(trimmed.to_owned()));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::NonNumericArticleId(trimmed.to_owned()));
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ArticleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for ArticleId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for ArticleId {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<ArticleId> for String {
  fn from(id: ArticleId) -> Self { id.0 }
}

impl AsRef<str> for ArticleId {
  fn as_ref(&self) -> &str { &self.0 }
}

// ─── ArticleRecord ───────────────────────────────────────────────────────────

/// One article entry extracted from an archive.
///
/// String attributes are empty when the source entry lacks them; `citations`
/// keeps source order and may contain duplicates or the record's own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
  pub id:            ArticleId,
  pub title:         String,
  /// `MM/DD/YYYY`; a missing component leaves its slot empty (`03//2020`).
  pub date:          String,
  pub abstract_text: String,
  /// ISO journal abbreviation.
  pub journal:       String,
  /// `"Lastname Initials"` pairs joined by `", "`.
  pub authors:       String,
  pub language:      String,
  pub country:       String,
  /// Raw identifiers found in the entry's reference lists, in source order.
  pub citations:     Vec<String>,
  pub major_topics:  String,
  pub minor_topics:  String,
}

impl ArticleRecord {
  /// A record with every descriptive attribute at its empty default.
  pub fn new(id: ArticleId) -> Self {
    Self {
      id,
      title: String::new(),
      date: String::new(),
      abstract_text: String::new(),
      journal: String::new(),
      authors: String::new(),
      language: String::new(),
      country: String::new(),
      citations: Vec::new(),
      major_topics: String::new(),
      minor_topics: String::new(),
    }
  }
}

// ─── Graph vocabulary ────────────────────────────────────────────────────────

/// Node label for articles in the destination graph.
pub const ARTICLE_LABEL: &str = "Article";

/// The property that uniquely identifies an [`ARTICLE_LABEL`] node.
pub const ARTICLE_KEY: &str = "ArticleId";

/// Directed edge type from a citing article to a cited article.
pub const CITES: &str = "CITES";

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_digits() {
    let id = ArticleId::parse(" 12345 ").unwrap();
    assert_eq!(id.as_str(), "12345");
  }

  #[test]
  fn rejects_empty_and_blank() {
    assert!(matches!(ArticleId::parse(""), Err(Error::EmptyArticleId)));
    assert!(matches!(ArticleId::parse("   "), Err(Error::EmptyArticleId)));
  }

  #[test]
  fn rejects_negative() {
    assert!(matches!(
      ArticleId::parse("-7"),
      Err(Error::NegativeArticleId(_))
    ));
  }

  #[test]
  fn rejects_non_numeric() {
    assert!(matches!(
      ArticleId::parse("10.1000/xyz"),
      Err(Error::NonNumericArticleId(_))
    ));
    assert!(matches!(
      ArticleId::parse("-"),
      Err(Error::NonNumericArticleId(_))
    ));
  }

  #[test]
  fn serde_validates_on_the_way_in() {
    let ok: ArticleId = serde_json::from_str("\"42\"").unwrap();
    assert_eq!(ok.as_str(), "42");
    assert!(serde_json::from_str::<ArticleId>("\"-1\"").is_err());
  }
}
