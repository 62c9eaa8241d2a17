//! SQL schema for the citegraph SQLite store.
//!
//! Executed once at connection startup. Unique constraints are not part of
//! the base schema; they are declared at runtime through
//! `GraphStore::ensure_unique_constraint` as partial unique indexes.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per graph node. A node carries only its label and key.
CREATE TABLE IF NOT EXISTS nodes (
    node_id INTEGER PRIMARY KEY,
    label   TEXT NOT NULL,
    key     TEXT NOT NULL
);

-- Directed, typed edges. The primary key makes parallel edges impossible.
CREATE TABLE IF NOT EXISTS edges (
    rel_type TEXT    NOT NULL,
    from_id  INTEGER NOT NULL REFERENCES nodes(node_id),
    to_id    INTEGER NOT NULL REFERENCES nodes(node_id),
    PRIMARY KEY (rel_type, from_id, to_id)
) WITHOUT ROWID;

-- Declared unique keys, one per label.
CREATE TABLE IF NOT EXISTS constraints (
    label    TEXT PRIMARY KEY,
    property TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS nodes_label_key_idx ON nodes(label, key);
CREATE INDEX IF NOT EXISTS edges_to_idx        ON edges(to_id, rel_type);

PRAGMA user_version = 1;
";

/// Create the node if no node with the same label and key exists. A single
/// statement, so the check and the insert cannot interleave with another
/// writer.
pub const MERGE_NODE: &str = "
INSERT INTO nodes (label, key)
SELECT ?1, ?2
WHERE NOT EXISTS (SELECT 1 FROM nodes WHERE label = ?1 AND key = ?2)";

/// Create the edge between two existing nodes unless it is already present.
pub const MERGE_EDGE: &str = "
INSERT OR IGNORE INTO edges (rel_type, from_id, to_id)
SELECT ?1, f.node_id, t.node_id
FROM nodes f, nodes t
WHERE f.label = ?2 AND f.key = ?3
  AND t.label = ?4 AND t.key = ?5";

/// DDL for the partial unique index backing a label's unique constraint.
/// `label` must already be validated as a plain identifier.
pub fn unique_index_ddl(label: &str) -> String {
  format!(
    "CREATE UNIQUE INDEX IF NOT EXISTS nodes_unique_{label} \
     ON nodes(key) WHERE label = '{label}'"
  )
}
