//! Record extraction: one [`ArticleRecord`] per top-level archive entry.
//!
//! Each field is resolved independently through explicit optional lookups. A
//! missing sub-structure leaves that field at its empty default; only a
//! missing or invalid identifier drops the entry.

use std::{
  collections::HashMap,
  fs::File,
  io::{BufRead, BufReader},
};

use citegraph_core::{
  archive::{ArchiveNumber, DecodedArchive},
  article::{ArticleId, ArticleRecord},
};
use tracing::{debug, warn};

use crate::{
  error::Result,
  tree::{Element, EntryReader},
};

// ─── Source vocabulary ───────────────────────────────────────────────────────

/// `PubStatus` of the date entry used as the publication date.
const PUBLICATION_STATUS: &str = "pubmed";

/// `IdType` of the identifier that keys a record.
const CITATION_ID_TYPE: &str = "pubmed";

/// Children of an entry that carry its identifier list.
const DATA_BLOCKS: [&str; 2] = ["PubmedData", "PubmedBookData"];

const SEPARATOR: &str = ", ";

// ─── Options and results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
  /// When non-empty, only reference identifiers whose `IdType` is listed are
  /// kept as citations. Empty keeps every identifier.
  pub citation_id_types: Vec<String>,
}

impl ExtractOptions {
  fn keeps_citation(&self, id_type: Option<&str>) -> bool {
    self.citation_id_types.is_empty()
      || id_type.is_some_and(|t| self.citation_id_types.iter().any(|k| k == t))
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
  /// Top-level entries read from the document.
  pub entries:    usize,
  /// Entries dropped because their identifier was missing or invalid.
  pub skipped:    usize,
  /// Entries whose identifier repeated an earlier entry in the same document.
  pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
  /// One record per distinct identifier, in order of first appearance.
  pub records: Vec<ArticleRecord>,
  pub stats:   ExtractStats,
}

// ─── Batch with last-write-wins de-duplication ───────────────────────────────

/// Collects records for one archive.
///
/// A repeated identifier replaces the earlier record in place: the later
/// entry's fields win, the batch position stays that of the first occurrence.
#[derive(Default)]
struct RecordBatch {
  extraction: Extraction,
  index:      HashMap<ArticleId, usize>,
}

impl RecordBatch {
  fn insert(&mut self, number: ArchiveNumber, record: ArticleRecord) {
    match self.index.get(&record.id) {
      Some(&slot) => {
        warn!(
          file_number = %number,
          article_id = %record.id,
          "duplicate article_id, keeping the later entry"
        );
        self.extraction.stats.duplicates += 1;
        self.extraction.records[slot] = record;
      }
      None => {
        self.index.insert(record.id.clone(), self.extraction.records.len());
        self.extraction.records.push(record);
      }
    }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Extract every record from a decoded archive, then delete the document.
pub fn extract(
  archive: DecodedArchive,
  options: &ExtractOptions,
) -> Result<Extraction> {
  let number = archive.number();
  let file = File::open(archive.path())?;
  let extraction = extract_from_reader(BufReader::new(file), number, options)?;
  archive.remove()?;
  Ok(extraction)
}

/// Extract every record from an XML document read from `input`.
pub fn extract_from_reader<R: BufRead>(
  input: R,
  number: ArchiveNumber,
  options: &ExtractOptions,
) -> Result<Extraction> {
  let mut batch = RecordBatch::default();

  for entry in EntryReader::new(input)? {
    let entry = entry?;
    batch.extraction.stats.entries += 1;

    match record_from_entry(&entry, options) {
      Ok(record) => batch.insert(number, record),
      Err(reason) => {
        warn!(file_number = %number, %reason, "missing article_id, entry skipped");
        batch.extraction.stats.skipped += 1;
      }
    }
  }

  let extraction = batch.extraction;
  debug!(
    file_number = %number,
    entries = extraction.stats.entries,
    records = extraction.records.len(),
    "document consumed"
  );
  Ok(extraction)
}

/// Build a record from one entry (`PubmedArticle`, `PubmedBookArticle`, ...).
///
/// Fails only when the entry has no usable citation-system identifier.
pub fn record_from_entry(
  entry: &Element,
  options: &ExtractOptions,
) -> citegraph_core::Result<ArticleRecord> {
  let id = ArticleId::parse(&article_id(entry).unwrap_or_default())?;

  let mut record = ArticleRecord::new(id);
  record.title = last_text(entry, "ArticleTitle");
  record.date = publication_date(entry).unwrap_or_default();
  record.abstract_text = abstract_text(entry).unwrap_or_default();
  record.journal = last_text(entry, "ISOAbbreviation");
  record.authors = authors(entry);
  record.language = last_text(entry, "Language");
  record.country = entry
    .path(&["MedlineCitation", "MedlineJournalInfo", "Country"])
    .map(Element::text)
    .unwrap_or_default();
  record.citations = citations(entry, options);
  (record.major_topics, record.minor_topics) = topics(entry);
  Ok(record)
}

// ─── Field resolvers ─────────────────────────────────────────────────────────

/// `ArticleIdList/ArticleId[@IdType="pubmed"]` under the entry's data block
/// (`PubmedData`, or `PubmedBookData` for books); the last match wins.
fn article_id(entry: &Element) -> Option<String> {
  DATA_BLOCKS
    .iter()
    .filter_map(|block| entry.path(&[*block, "ArticleIdList"]))
    .flat_map(|list| list.children_named("ArticleId"))
    .filter(|id| id.attr("IdType") == Some(CITATION_ID_TYPE))
    .last()
    .map(Element::text)
}

/// Text of the last descendant named `name`, or empty.
fn last_text(entry: &Element, name: &str) -> String {
  entry.find_all(name).last().map(Element::text).unwrap_or_default()
}

/// `MM/DD/YYYY` from the last `PubMedPubDate` whose `PubStatus` marks the
/// publication date. Missing components leave empty slots.
fn publication_date(entry: &Element) -> Option<String> {
  let date = entry
    .find_all("PubMedPubDate")
    .filter(|d| d.attr("PubStatus") == Some(PUBLICATION_STATUS))
    .last()?;

  let component = |name: &str, width: usize| {
    date
      .child(name)
      .map(Element::text)
      .filter(|t| !t.is_empty())
      .map(|t| zero_pad(&t, width))
      .unwrap_or_default()
  };

  Some(format!(
    "{}/{}/{}",
    component("Month", 2),
    component("Day", 2),
    component("Year", 0)
  ))
}

/// Left-pad with zeros to `width`; longer values are returned unchanged.
fn zero_pad(value: &str, width: usize) -> String { format!("{value:0>width$}") }

/// First `AbstractText` of the last `Abstract` in the entry.
fn abstract_text(entry: &Element) -> Option<String> {
  let abstract_el = entry.find_all("Abstract").last()?;
  Some(
    abstract_el
      .child("AbstractText")
      .map(Element::text)
      .unwrap_or_default(),
  )
}

/// `"Lastname Initials"` for every author of every author list, joined by
/// `", "`. An author with no last name contributes its collective name, or an
/// empty slot.
fn authors(entry: &Element) -> String {
  let names: Vec<String> = entry
    .find_all("AuthorList")
    .flat_map(|list| list.children_named("Author"))
    .map(author_name)
    .collect();
  names.join(SEPARATOR)
}

fn author_name(author: &Element) -> String {
  let Some(last) = author.child("LastName") else {
    return author
      .child("CollectiveName")
      .map(Element::text)
      .unwrap_or_default();
  };

  let mut name = last.text();
  if let Some(initials) = author.child("Initials").map(Element::text)
    && !initials.is_empty()
  {
    name.push(' ');
    name.push_str(&initials);
  }
  name
}

/// Every `ArticleId` inside any `ReferenceList`, in document order. Each id
/// element is counted once even when reference lists nest.
fn citations(entry: &Element, options: &ExtractOptions) -> Vec<String> {
  fn walk(
    el: &Element,
    in_refs: bool,
    options: &ExtractOptions,
    out: &mut Vec<String>,
  ) {
    for child in el.elements() {
      if in_refs && child.name == "ArticleId" {
        let id = child.text();
        if !id.is_empty() && options.keeps_citation(child.attr("IdType")) {
          out.push(id);
        }
        continue;
      }
      walk(child, in_refs || child.name == "ReferenceList", options, out);
    }
  }

  let mut out = Vec::new();
  walk(entry, false, options, &mut out);
  out
}

/// Major and minor MeSH descriptors, each joined by `", "`. Descriptors
/// without a `MajorTopicYN` flag are ignored.
fn topics(entry: &Element) -> (String, String) {
  let mut major = Vec::new();
  let mut minor = Vec::new();
  for descriptor in entry.find_all("DescriptorName") {
    match descriptor.attr("MajorTopicYN") {
      Some("Y") => major.push(descriptor.text()),
      Some("N") => minor.push(descriptor.text()),
      _ => {}
    }
  }
  (major.join(SEPARATOR), minor.join(SEPARATOR))
}
