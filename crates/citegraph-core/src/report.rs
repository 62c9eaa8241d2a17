//! Per-file outcomes and the per-run report.
//!
//! Each archive moves through `Retrieving -> Extracting -> Loading`; the first
//! stage to fail ends that archive's pass and is recorded here. Other archives
//! are unaffected.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{archive::ArchiveNumber, store::CommitSummary};

// ─── Stage ───────────────────────────────────────────────────────────────────

/// A pipeline stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Retrieving,
  Extracting,
  Loading,
}

impl Stage {
  /// The report label for a file that failed in this stage.
  pub fn failure_label(self) -> &'static str {
    match self {
      Self::Retrieving => "failed-at-retrieval",
      Self::Extracting => "failed-at-parsing",
      Self::Loading => "failed-at-loading",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Retrieving => "xml download",
      Self::Extracting => "xml parsing",
      Self::Loading => "graph ingestion",
    })
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// One committed transaction within a file's load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCommit {
  /// Zero-based position of the batch within the file.
  pub batch:   usize,
  /// Records written by this batch.
  pub records: usize,
  #[serde(flatten)]
  pub summary: CommitSummary,
}

/// A file that went through all three stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
  pub file_number: ArchiveNumber,
  /// Top-level entries seen in the document.
  pub entries:     usize,
  /// Distinct valid records loaded.
  pub records:     usize,
  /// Entries dropped for a missing or invalid identifier.
  pub skipped:     usize,
  /// Entries whose identifier had already been seen in the same file.
  pub duplicates:  usize,
  /// Citation edges merged (before store-side de-duplication).
  pub citations:   usize,
  pub batches:     Vec<BatchCommit>,
}

/// A file whose pass ended in a failed stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("file number {file_number}, {stage} failed: {description}")]
pub struct IngestFailure {
  pub file_number: ArchiveNumber,
  pub stage:       Stage,
  pub description: String,
}

/// The terminal outcome of one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
  Completed(FileSummary),
  Failed(IngestFailure),
}

impl FileOutcome {
  pub fn file_number(&self) -> ArchiveNumber {
    match self {
      Self::Completed(s) => s.file_number,
      Self::Failed(f) => f.file_number,
    }
  }

  /// `completed`, `failed-at-retrieval`, `failed-at-parsing` or
  /// `failed-at-loading`.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Completed(_) => "completed",
      Self::Failed(f) => f.stage.failure_label(),
    }
  }

  pub fn is_completed(&self) -> bool { matches!(self, Self::Completed(_)) }
}

/// `0007: failed-at-parsing`
impl fmt::Display for FileOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.file_number(), self.label())
  }
}

// ─── RunReport ───────────────────────────────────────────────────────────────

/// Everything a run did, one outcome per archive number, in ascending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  pub run_id:      Uuid,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub outcomes:    Vec<FileOutcome>,
}

impl RunReport {
  pub fn completed(&self) -> impl Iterator<Item = &FileSummary> {
    self.outcomes.iter().filter_map(|o| match o {
      FileOutcome::Completed(s) => Some(s),
      FileOutcome::Failed(_) => None,
    })
  }

  pub fn failed(&self) -> impl Iterator<Item = &IngestFailure> {
    self.outcomes.iter().filter_map(|o| match o {
      FileOutcome::Failed(f) => Some(f),
      FileOutcome::Completed(_) => None,
    })
  }

  /// Sum of every committed batch across completed files.
  pub fn committed(&self) -> CommitSummary {
    let mut total = CommitSummary::default();
    for batch in self.completed().flat_map(|s| &s.batches) {
      total += batch.summary;
    }
    total
  }

  pub fn outcome(&self, number: ArchiveNumber) -> Option<&FileOutcome> {
    self.outcomes.iter().find(|o| o.file_number() == number)
  }
}
