//! [`SqliteStore`], the SQLite implementation of [`GraphStore`].

use std::path::Path;

use citegraph_core::store::{GraphStore, NodeKey, validate_identifier};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  Error, Result,
  schema::{SCHEMA, unique_index_ddl},
  transaction::SqliteTransaction,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A citation graph backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection thread, so transactions from concurrent workers are
/// applied one after another.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Number of nodes carrying `label`.
  pub async fn node_count(&self, label: &str) -> Result<u64> {
    let label = label.to_owned();
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM nodes WHERE label = ?1",
          rusqlite::params![label],
          |r| r.get::<_, i64>(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  /// Number of edges of type `rel_type`.
  pub async fn edge_count(&self, rel_type: &str) -> Result<u64> {
    let rel_type = rel_type.to_owned();
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM edges WHERE rel_type = ?1",
          rusqlite::params![rel_type],
          |r| r.get::<_, i64>(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  pub async fn has_node(&self, node: NodeKey<'_>) -> Result<bool> {
    let label = node.label.to_owned();
    let key   = node.key.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM nodes WHERE label = ?1 AND key = ?2",
              rusqlite::params![label, key],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  /// Keys of the nodes reached from `from` over `rel_type` edges, sorted.
  pub async fn outgoing(
    &self,
    rel_type: &str,
    from:     NodeKey<'_>,
  ) -> Result<Vec<String>> {
    let rel_type = rel_type.to_owned();
    let label    = from.label.to_owned();
    let key      = from.key.to_owned();
    let keys = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT t.key
           FROM edges e
           JOIN nodes f ON f.node_id = e.from_id
           JOIN nodes t ON t.node_id = e.to_id
           WHERE e.rel_type = ?1 AND f.label = ?2 AND f.key = ?3
           ORDER BY t.key",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![rel_type, label, key], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(keys)
  }

  /// The property a label is declared unique on, if any.
  pub async fn unique_property(&self, label: &str) -> Result<Option<String>> {
    let label = label.to_owned();
    let property = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT property FROM constraints WHERE label = ?1",
              rusqlite::params![label],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(property)
  }
}

// ─── GraphStore impl ─────────────────────────────────────────────────────────

impl GraphStore for SqliteStore {
  type Error = Error;
  type Transaction = SqliteTransaction;

  async fn ensure_unique_constraint(&self, label: &str, property: &str) -> Result<()> {
    let label    = validate_identifier(label)?.to_owned();
    let property = validate_identifier(property)?.to_owned();
    let ddl      = unique_index_ddl(&label);

    let (label_c, property_c) = (label.clone(), property.clone());
    let existing: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT OR IGNORE INTO constraints (label, property) VALUES (?1, ?2)",
          rusqlite::params![label_c, property_c],
        )?;
        let existing: String = tx.query_row(
          "SELECT property FROM constraints WHERE label = ?1",
          rusqlite::params![label_c],
          |r| r.get(0),
        )?;
        if existing == property_c {
          tx.execute_batch(&ddl)?;
        }
        tx.commit()?;
        Ok(existing)
      })
      .await?;

    if existing != property {
      return Err(Error::ConstraintConflict { label, existing, requested: property });
    }

    debug!(%label, %property, "unique constraint in place");
    Ok(())
  }

  async fn begin_transaction(&self) -> Result<SqliteTransaction> {
    Ok(SqliteTransaction::new(self.conn.clone()))
  }
}
