//! [`SqliteTransaction`]: buffered merges applied in one SQLite transaction.

use citegraph_core::store::{CommitSummary, GraphTransaction, NodeKey};
use rusqlite::TransactionBehavior;

use crate::{
  Error, Result,
  schema::{MERGE_EDGE, MERGE_NODE},
};

enum Merge {
  Node {
    label: Box<str>,
    key:   Box<str>,
  },
  Edge {
    rel_type:   Box<str>,
    from_label: Box<str>,
    from_key:   Box<str>,
    to_label:   Box<str>,
    to_key:     Box<str>,
  },
}

/// A batch of merges against a [`SqliteStore`](crate::SqliteStore).
///
/// Merges are held in memory and written by [`commit`](GraphTransaction::commit)
/// inside a single `BEGIN IMMEDIATE` transaction. If any statement fails the
/// SQLite transaction rolls back and nothing from this batch is visible.
pub struct SqliteTransaction {
  conn:   tokio_rusqlite::Connection,
  merges: Vec<Merge>,
}

impl SqliteTransaction {
  pub(crate) fn new(conn: tokio_rusqlite::Connection) -> Self {
    Self { conn, merges: Vec::new() }
  }
}

impl GraphTransaction for SqliteTransaction {
  type Error = Error;

  fn merge_node(&mut self, node: NodeKey<'_>) -> Result<()> {
    self.merges.push(Merge::Node { label: node.label.into(), key: node.key.into() });
    Ok(())
  }

  fn merge_edge(
    &mut self,
    rel_type: &str,
    from:     NodeKey<'_>,
    to:       NodeKey<'_>,
  ) -> Result<()> {
    self.merges.push(Merge::Edge {
      rel_type:   rel_type.into(),
      from_label: from.label.into(),
      from_key:   from.key.into(),
      to_label:   to.label.into(),
      to_key:     to.key.into(),
    });
    Ok(())
  }

  fn pending(&self) -> usize { self.merges.len() }

  async fn commit(self) -> Result<CommitSummary> {
    let merges = self.merges;
    if merges.is_empty() {
      return Ok(CommitSummary::default());
    }

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut summary = CommitSummary::default();
        {
          let mut node = tx.prepare_cached(MERGE_NODE)?;
          let mut edge = tx.prepare_cached(MERGE_EDGE)?;

          for merge in &merges {
            match merge {
              Merge::Node { label, key } => {
                summary.nodes_created += node.execute([&**label, &**key])? as u64;
              }
              Merge::Edge { rel_type, from_label, from_key, to_label, to_key } => {
                summary.nodes_created += node.execute([&**from_label, &**from_key])? as u64;
                summary.nodes_created += node.execute([&**to_label, &**to_key])? as u64;
                summary.edges_created += edge.execute([
                  &**rel_type,
                  &**from_label,
                  &**from_key,
                  &**to_label,
                  &**to_key,
                ])? as u64;
              }
            }
          }
        }
        tx.commit()?;
        Ok(summary)
      })
      .await?;

    Ok(summary)
  }

  async fn rollback(self) -> Result<()> {
    // Nothing reaches SQLite before commit, so discarding the buffer is enough.
    drop(self.merges);
    Ok(())
  }
}
