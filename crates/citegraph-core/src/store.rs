//! The `GraphStore` trait and its transaction handle.
//!
//! The traits are implemented by storage backends (e.g.
//! `citegraph-store-sqlite`). The loader depends on this abstraction, not on
//! any concrete backend.
//!
//! Every write is a merge: creating something that already exists is a no-op.
//! Backends must make each merge atomic on their side so that concurrent
//! writers never duplicate a node or an edge.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Identifies a node by label and unique key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey<'a> {
  pub label: &'a str,
  pub key:   &'a str,
}

impl<'a> NodeKey<'a> {
  pub fn new(label: &'a str, key: &'a str) -> Self { Self { label, key } }
}

/// Labels, property names and edge types are interpolated into backend DDL,
/// so they are restricted to `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(ident: &str) -> Result<&str> {
  let mut bytes = ident.bytes();
  let valid = match bytes.next() {
    Some(first) => {
      (first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }
    None => false,
  };
  if valid {
    Ok(ident)
  } else {
    Err(Error::InvalidIdentifier(ident.to_owned()))
  }
}

// ─── Commit summary ──────────────────────────────────────────────────────────

/// What a single committed transaction changed in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
  /// Node merges that created a new node.
  pub nodes_created: u64,
  /// Edge merges that created a new edge.
  pub edges_created: u64,
}

impl std::ops::AddAssign for CommitSummary {
  fn add_assign(&mut self, rhs: Self) {
    self.nodes_created += rhs.nodes_created;
    self.edges_created += rhs.edges_created;
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Abstraction over a destination graph store.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime with several ingestion workers.
pub trait GraphStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
  type Transaction: GraphTransaction<Error = Self::Error>;

  /// Declare `property` as the unique key of nodes labelled `label`.
  ///
  /// Idempotent: declaring an existing constraint again succeeds.
  fn ensure_unique_constraint<'a>(
    &'a self,
    label: &'a str,
    property: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Open a new transaction. Nothing written through it is visible until
  /// [`GraphTransaction::commit`] succeeds.
  fn begin_transaction(
    &self,
  ) -> impl Future<Output = Result<Self::Transaction, Self::Error>> + Send + '_;
}

/// A unit of work against a [`GraphStore`].
///
/// Merges only record intent; the store is touched when the transaction is
/// committed. Dropping a transaction without committing discards it.
pub trait GraphTransaction: Send + Sized {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create the node if it does not exist yet.
  fn merge_node(&mut self, node: NodeKey<'_>) -> Result<(), Self::Error>;

  /// Create a directed `rel_type` edge if it does not exist yet. Missing
  /// endpoints are created as key-only nodes.
  fn merge_edge(
    &mut self,
    rel_type: &str,
    from: NodeKey<'_>,
    to: NodeKey<'_>,
  ) -> Result<(), Self::Error>;

  /// Number of merges recorded since the transaction was opened.
  fn pending(&self) -> usize;

  /// Apply every recorded merge atomically.
  fn commit(self)
  -> impl Future<Output = Result<CommitSummary, Self::Error>> + Send;

  /// Discard every recorded merge.
  fn rollback(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
