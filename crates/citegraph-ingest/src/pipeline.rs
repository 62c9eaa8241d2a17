//! The pipeline orchestrator.
//!
//! Each archive number passes through retrieval, extraction and loading. A
//! stage failure ends that archive's pass with a [`FileOutcome::Failed`] and
//! the run moves on; nothing short of a panic stops it early.

use std::{collections::BTreeSet, ops::RangeInclusive, sync::Arc};

use chrono::Utc;
use citegraph_core::{
  archive::ArchiveNumber,
  report::{FileOutcome, FileSummary, IngestFailure, RunReport, Stage},
  store::GraphStore,
};
use citegraph_pubmed::{ExtractOptions, extract};
use tokio::task::JoinSet;
use tracing::{Instrument as _, error, info, info_span};
use uuid::Uuid;

use crate::{
  config::IngestConfig,
  load::Loader,
  retrieve::Retriever,
  transport::Transport,
};

/// Runs archives through the three stages.
///
/// Cheap to clone; clones share the transport, the store and the one-time
/// constraint setup.
pub struct Pipeline<T, S> {
  retriever: Arc<Retriever<T>>,
  loader:    Arc<Loader<S>>,
  options:   Arc<ExtractOptions>,
  workers:   usize,
}

impl<T, S> Clone for Pipeline<T, S> {
  fn clone(&self) -> Self {
    Self {
      retriever: Arc::clone(&self.retriever),
      loader:    Arc::clone(&self.loader),
      options:   Arc::clone(&self.options),
      workers:   self.workers,
    }
  }
}

impl<T, S> Pipeline<T, S>
where
  T: Transport + 'static,
  S: GraphStore + 'static,
{
  pub fn new(transport: T, store: Arc<S>, config: &IngestConfig) -> Self {
    Self {
      retriever: Arc::new(Retriever::new(transport, config)),
      loader:    Arc::new(Loader::new(store, config.batch_size)),
      options:   Arc::new(config.extract_options()),
      workers:   config.workers.max(1),
    }
  }

  pub fn store(&self) -> &S { self.loader.store() }

  /// Process every archive in `range` and report each one's outcome.
  ///
  /// With one worker archives are handled strictly in order. With more,
  /// up to `workers` archives are in flight at once; the report is still
  /// sorted by archive number.
  pub async fn run(&self, range: RangeInclusive<u32>) -> RunReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(
      %run_id,
      first = range.start(),
      last = range.end(),
      workers = self.workers,
      "ingestion run started"
    );

    let mut outcomes = if self.workers == 1 {
      let mut outcomes = Vec::new();
      for n in range {
        outcomes.push(self.process(ArchiveNumber(n)).await);
      }
      outcomes
    } else {
      self.run_concurrently(range).await
    };
    outcomes.sort_by_key(FileOutcome::file_number);

    let report = RunReport { run_id, started_at, finished_at: Utc::now(), outcomes };
    let committed = report.committed();
    info!(
      %run_id,
      completed = report.completed().count(),
      failed = report.failed().count(),
      nodes_created = committed.nodes_created,
      edges_created = committed.edges_created,
      "ingestion run finished"
    );
    report
  }

  async fn run_concurrently(&self, range: RangeInclusive<u32>) -> Vec<FileOutcome> {
    let mut queue = range.map(ArchiveNumber);
    let mut pending = BTreeSet::new();
    let mut tasks = JoinSet::new();
    let mut outcomes = Vec::new();

    loop {
      while tasks.len() < self.workers {
        let Some(number) = queue.next() else { break };
        pending.insert(number);
        let pipeline = self.clone();
        tasks.spawn(async move { pipeline.process(number).await });
      }

      let Some(joined) = tasks.join_next().await else { break };
      match joined {
        Ok(outcome) => {
          pending.remove(&outcome.file_number());
          outcomes.push(outcome);
        }
        Err(e) => error!(error = %e, "ingestion worker panicked"),
      }
    }

    // Archives whose worker died without reporting.
    outcomes.extend(pending.into_iter().map(|number| {
      FileOutcome::Failed(IngestFailure {
        file_number: number,
        stage:       Stage::Loading,
        description: "worker terminated unexpectedly".into(),
      })
    }));
    outcomes
  }

  /// Run one archive through retrieval, extraction and loading.
  pub async fn process(&self, number: ArchiveNumber) -> FileOutcome {
    let span = info_span!("file", file_number = %number);
    self.process_inner(number).instrument(span).await
  }

  async fn process_inner(&self, number: ArchiveNumber) -> FileOutcome {
    let archive = match self.retriever.fetch(number).await {
      Ok(archive) => archive,
      Err(e) => return failed(number, Stage::Retrieving, e),
    };

    let options = Arc::clone(&self.options);
    let extraction = match tokio::task::spawn_blocking(move || extract(archive, &options)).await {
      Ok(Ok(extraction)) => extraction,
      Ok(Err(e)) => return failed(number, Stage::Extracting, e),
      Err(e) => return failed(number, Stage::Extracting, e),
    };
    info!(
      file_number = %number,
      entries = extraction.stats.entries,
      records = extraction.records.len(),
      skipped = extraction.stats.skipped,
      duplicates = extraction.stats.duplicates,
      "extraction finished"
    );

    let loaded = match self.loader.load(number, &extraction.records).await {
      Ok(loaded) => loaded,
      Err(e) => return failed(number, Stage::Loading, e),
    };

    let summary = FileSummary {
      file_number: number,
      entries:     extraction.stats.entries,
      records:     loaded.records,
      skipped:     extraction.stats.skipped,
      duplicates:  extraction.stats.duplicates,
      citations:   loaded.citations,
      batches:     loaded.batches,
    };
    info!(
      file_number = %number,
      records = summary.records,
      citations = summary.citations,
      batches = summary.batches.len(),
      "file completed"
    );
    FileOutcome::Completed(summary)
  }
}

fn failed(number: ArchiveNumber, stage: Stage, cause: impl std::fmt::Display) -> FileOutcome {
  let failure = IngestFailure {
    file_number: number,
    stage,
    description: cause.to_string(),
  };
  error!(file_number = %number, %stage, error = %failure.description, "file failed");
  FileOutcome::Failed(failure)
}
