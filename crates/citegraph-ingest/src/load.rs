//! Citation graph loading.
//!
//! Every record becomes an `Article` node keyed by its identifier, and every
//! citation a `CITES` edge from the citing record to the cited identifier.
//! Cited identifiers with no record of their own become key-only placeholder
//! nodes. All writes are merges, so loading the same records twice leaves the
//! graph unchanged.
//!
//! Records are written in transactions of `batch_size` records. A failure
//! aborts the open transaction only; batches already committed stay.

use std::sync::Arc;

use citegraph_core::{
  archive::ArchiveNumber,
  article::{ARTICLE_KEY, ARTICLE_LABEL, ArticleRecord, CITES},
  report::BatchCommit,
  store::{GraphStore, GraphTransaction, NodeKey},
};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::LoadError;

/// What one file's load wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
  pub records:   usize,
  /// Citation edges merged, before store-side de-duplication.
  pub citations: usize,
  pub batches:   Vec<BatchCommit>,
}

pub struct Loader<S> {
  store:      Arc<S>,
  batch_size: usize,
  constraint: OnceCell<()>,
}

impl<S: GraphStore> Loader<S> {
  pub fn new(store: Arc<S>, batch_size: usize) -> Self {
    Self { store, batch_size: batch_size.max(1), constraint: OnceCell::new() }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Declare `Article.ArticleId` unique. Runs against the store once per
  /// loader; a failed attempt is repeated on the next call.
  pub async fn ensure_constraint(&self) -> Result<(), S::Error> {
    self
      .constraint
      .get_or_try_init(|| self.store.ensure_unique_constraint(ARTICLE_LABEL, ARTICLE_KEY))
      .await?;
    Ok(())
  }

  /// Merge `records` into the graph, committing every `batch_size` records.
  ///
  /// A trailing batch is committed only if it holds at least one record.
  pub async fn load(
    &self,
    number: ArchiveNumber,
    records: &[ArticleRecord],
  ) -> Result<LoadResult, LoadError> {
    self.ensure_constraint().await.map_err(|e| LoadError::new(0, 0, e))?;

    let mut result = LoadResult::default();
    for (batch, chunk) in records.chunks(self.batch_size).enumerate() {
      let committed = result.batches.len();
      let fail = |e: S::Error| LoadError::new(batch, committed, e);

      let mut tx = self.store.begin_transaction().await.map_err(fail)?;
      let citations = match stage_batch(&mut tx, chunk) {
        Ok(citations) => citations,
        Err(e) => {
          // The merge error is what gets reported; a failing rollback adds
          // nothing to it.
          let _ = tx.rollback().await;
          return Err(fail(e));
        }
      };
      debug!(file_number = %number, batch, pending = tx.pending(), "batch staged");

      let summary = tx.commit().await.map_err(fail)?;
      let commit = BatchCommit { batch, records: chunk.len(), summary };
      info!(
        file_number = %number,
        batch,
        records = commit.records,
        nodes_created = summary.nodes_created,
        edges_created = summary.edges_created,
        "batch committed"
      );

      result.records += chunk.len();
      result.citations += citations;
      result.batches.push(commit);
    }
    Ok(result)
  }
}

/// Record the merges for one batch; returns the number of citation edges.
fn stage_batch<T: GraphTransaction>(
  tx: &mut T,
  records: &[ArticleRecord],
) -> Result<usize, T::Error> {
  let mut citations = 0;
  for record in records {
    let citing = NodeKey::new(ARTICLE_LABEL, record.id.as_str());
    tx.merge_node(citing)?;
    for cited in &record.citations {
      let cited = NodeKey::new(ARTICLE_LABEL, cited);
      tx.merge_node(cited)?;
      tx.merge_edge(CITES, citing, cited)?;
      citations += 1;
    }
  }
  Ok(citations)
}
