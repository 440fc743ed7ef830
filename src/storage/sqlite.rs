//! SQLite storage backend for tagweave

use super::traits::{
    creation_weight, GraphStore, OpenStore, StorageError, StorageResult, StoreSnapshot,
};
use crate::graph::{Edge, Label, Node, Upsert};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

const EDGE_COLUMNS: &str = "id, source, target, weight";

/// SQLite-backed topic graph store
///
/// One database file with a `nodes` table keyed by label and an `edges`
/// table whose endpoints are foreign keys into `nodes` (`ON DELETE CASCADE`).
/// A unique expression index on `(min(source, target), max(source, target))`
/// enforces one edge per unordered pair; plain indexes on `source` and
/// `target` back the reverse lookups.
///
/// Thread-safe via internal mutex on the connection. Each trait method runs
/// in its own `rusqlite::Transaction`, which rolls back on drop unless
/// committed.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                label TEXT PRIMARY KEY NOT NULL,
                weight INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL REFERENCES nodes(label) ON DELETE CASCADE,
                target TEXT NOT NULL REFERENCES nodes(label) ON DELETE CASCADE,
                weight INTEGER NOT NULL DEFAULT 1
            );

            -- One edge per unordered pair
            CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_pair
                ON edges(min(source, target), max(source, target));

            -- Reverse lookups: label -> incident edges
            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Run `f` inside a single transaction, committing only if it succeeds
    fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn row_to_node(row: &Row<'_>) -> rusqlite::Result<Node> {
        Ok(Node {
            label: Label::from_string(row.get::<_, String>(0)?),
            weight: row.get(1)?,
        })
    }

    /// Deserialize an edge from `EDGE_COLUMNS`, keeping the row id
    fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<(i64, Edge)> {
        Ok((
            row.get(0)?,
            Edge {
                source: Label::from_string(row.get::<_, String>(1)?),
                target: Label::from_string(row.get::<_, String>(2)?),
                weight: row.get(3)?,
            },
        ))
    }

    fn load_nodes(conn: &Connection) -> StorageResult<Vec<Node>> {
        let mut stmt = conn.prepare("SELECT label, weight FROM nodes ORDER BY label")?;
        let nodes = stmt
            .query_map([], Self::row_to_node)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    fn load_edges(conn: &Connection) -> StorageResult<Vec<Edge>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges ORDER BY source, id"
        ))?;
        let edges = stmt
            .query_map([], Self::row_to_edge)?
            .map(|r| r.map(|(_, edge)| edge))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Unordered-pair lookup, served by `idx_edges_pair`
    fn query_edge(conn: &Connection, a: &str, b: &str) -> StorageResult<Option<(i64, Edge)>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {EDGE_COLUMNS} FROM edges
                     WHERE min(source, target) = min(?1, ?2)
                       AND max(source, target) = max(?1, ?2)"
                ),
                params![a, b],
                Self::row_to_edge,
            )
            .optional()?;
        Ok(row)
    }

    fn node_exists(conn: &Connection, label: &str) -> StorageResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM nodes WHERE label = ?1)",
            params![label],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Write a consistent copy of the database to `path` (`VACUUM INTO`).
    ///
    /// The destination must not exist yet.
    pub fn backup_to(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = self.lock()?;
        conn.execute("VACUUM INTO ?1", params![path.to_string_lossy()])?;
        info!("Backed up topic store to {}", path.display());
        Ok(())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening topic store at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    // === Node Operations ===

    fn upsert_node(&self, label: &str, initial_weight: u32) -> StorageResult<Upsert<Node>> {
        self.with_transaction(|tx| {
            let existing: Option<u32> = tx
                .query_row(
                    "SELECT weight FROM nodes WHERE label = ?1",
                    params![label],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                None => {
                    let weight = creation_weight(initial_weight);
                    tx.execute(
                        "INSERT INTO nodes (label, weight) VALUES (?1, ?2)",
                        params![label, weight],
                    )?;
                    debug!(label, weight, "created node");
                    Ok(Upsert::Created(Node::new(label).with_weight(weight)))
                }
                Some(current) => {
                    let weight = current.saturating_add(1);
                    tx.execute(
                        "UPDATE nodes SET weight = ?2 WHERE label = ?1",
                        params![label, weight],
                    )?;
                    debug!(label, weight, "reinforced node");
                    Ok(Upsert::Reinforced(Node::new(label).with_weight(weight)))
                }
            }
        })
    }

    fn find_node(&self, label: &str) -> StorageResult<Option<Node>> {
        let conn = self.lock()?;
        let node = conn
            .query_row(
                "SELECT label, weight FROM nodes WHERE label = ?1",
                params![label],
                Self::row_to_node,
            )
            .optional()?;
        Ok(node)
    }

    fn delete_node(&self, label: &str) -> StorageResult<bool> {
        self.with_transaction(|tx| {
            // Delete edges connected to this node
            let edges = tx.execute(
                "DELETE FROM edges WHERE source = ?1 OR target = ?1",
                params![label],
            )?;

            // Delete the node
            let rows = tx.execute("DELETE FROM nodes WHERE label = ?1", params![label])?;

            debug!(label, edges, removed = rows > 0, "deleted node");
            Ok(rows > 0)
        })
    }

    fn list_nodes(&self) -> StorageResult<Vec<Node>> {
        self.with_transaction(|tx| Self::load_nodes(tx))
    }

    fn delete_all_nodes(&self) -> StorageResult<usize> {
        self.with_transaction(|tx| {
            let edges = tx.execute("DELETE FROM edges", [])?;
            let nodes = tx.execute("DELETE FROM nodes", [])?;
            info!(nodes, edges, "cleared topic store");
            Ok(nodes)
        })
    }

    // === Edge Operations ===

    fn edge_exists(&self, a: &str, b: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        Ok(Self::query_edge(&conn, a, b)?.is_some())
    }

    fn find_edge(&self, a: &str, b: &str) -> StorageResult<Option<Edge>> {
        let conn = self.lock()?;
        Ok(Self::query_edge(&conn, a, b)?.map(|(_, edge)| edge))
    }

    fn upsert_edge(&self, a: &str, b: &str, weight_delta: u32) -> StorageResult<Upsert<Edge>> {
        self.with_transaction(|tx| {
            let Some((id, edge)) = Self::query_edge(tx, a, b)? else {
                for label in [a, b] {
                    if !Self::node_exists(tx, label)? {
                        return Err(StorageError::MissingNode(label.to_string()));
                    }
                }

                let weight = creation_weight(weight_delta);
                tx.execute(
                    "INSERT INTO edges (source, target, weight) VALUES (?1, ?2, ?3)",
                    params![a, b, weight],
                )?;
                debug!(source = a, target = b, weight, "created edge");
                return Ok(Upsert::Created(Edge::new(a, b).with_weight(weight)));
            };

            let Some(weight) = edge.weight.checked_add(weight_delta) else {
                warn!(
                    source = a,
                    target = b,
                    edge = ?edge,
                    weight_delta,
                    "edge weight increment overflows; edge left unchanged"
                );
                return Ok(Upsert::Skipped);
            };

            match tx.execute("UPDATE edges SET weight = ?2 WHERE id = ?1", params![id, weight]) {
                Ok(1) => {
                    debug!(source = a, target = b, weight, "reinforced edge");
                    Ok(Upsert::Reinforced(Edge { weight, ..edge }))
                }
                Ok(rows) => {
                    warn!(
                        source = a,
                        target = b,
                        edge = ?edge,
                        rows,
                        "resolved edge was not updated; edge left unchanged"
                    );
                    Ok(Upsert::Skipped)
                }
                Err(e) => {
                    warn!(
                        source = a,
                        target = b,
                        edge = ?edge,
                        error = %e,
                        "failed to increment edge weight; edge left unchanged"
                    );
                    Ok(Upsert::Skipped)
                }
            }
        })
    }

    fn list_edges(&self) -> StorageResult<Vec<Edge>> {
        self.with_transaction(|tx| Self::load_edges(tx))
    }

    fn delete_edge(&self, source: &str, target: &str) -> StorageResult<usize> {
        self.with_transaction(|tx| {
            let rows = tx.execute(
                "DELETE FROM edges WHERE source = ?1 AND target = ?2",
                params![source, target],
            )?;
            debug!(source, target, rows, "deleted edge");
            Ok(rows)
        })
    }

    fn edges_touching(&self, label: &str) -> StorageResult<Vec<Edge>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges
             WHERE source = ?1 OR target = ?1
             ORDER BY source, id"
        ))?;
        let edges = stmt
            .query_map(params![label], Self::row_to_edge)?
            .map(|r| r.map(|(_, edge)| edge))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    // === Snapshot ===

    fn snapshot(&self) -> StorageResult<StoreSnapshot> {
        self.with_transaction(|tx| {
            let nodes = Self::load_nodes(tx)?;
            let edges = Self::load_edges(tx)?;
            Ok(StoreSnapshot::new(nodes, edges))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_linked_pair(store: &SqliteStore, a: &str, b: &str) {
        store.upsert_node(a, 1).unwrap();
        store.upsert_node(b, 1).unwrap();
        store.upsert_edge(a, b, 1).unwrap();
    }

    #[test]
    fn test_wal_mode_enabled_at_connection() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test-wal.db");
        let store = SqliteStore::open(&db_path).unwrap();

        let journal_mode: String = store
            .conn
            .lock()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(journal_mode, "wal", "SqliteStore must enable WAL mode at connection time");
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = create_test_store();
        let enabled: bool = store
            .conn
            .lock()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }

    #[test]
    fn test_schema_rejects_dangling_edge() {
        let store = create_test_store();
        let result = store.conn.lock().unwrap().execute(
            "INSERT INTO edges (source, target, weight) VALUES ('#ghost', '#phantom', 1)",
            [],
        );
        assert!(result.is_err(), "foreign keys must reject edges to unknown labels");
    }

    #[test]
    fn test_schema_rejects_reversed_duplicate_edge() {
        let store = create_test_store();
        create_linked_pair(&store, "#a", "#b");

        let result = store.conn.lock().unwrap().execute(
            "INSERT INTO edges (source, target, weight) VALUES ('#b', '#a', 1)",
            [],
        );
        assert!(result.is_err(), "pair index must treat (b, a) as a duplicate of (a, b)");
    }

    #[test]
    fn test_delete_node_cascades_edges() {
        let store = create_test_store();
        create_linked_pair(&store, "#a", "#b");
        create_linked_pair(&store, "#c", "#a");
        create_linked_pair(&store, "#b", "#c");

        // Delete node A - should also delete both edges touching it
        assert!(store.delete_node("#a").unwrap());

        let edges = store.list_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert!(edges[0].is_exactly("#b", "#c"));
    }

    #[test]
    fn test_foreign_key_cascade_on_raw_delete() {
        let store = create_test_store();
        create_linked_pair(&store, "#a", "#b");

        store
            .conn
            .lock()
            .unwrap()
            .execute("DELETE FROM nodes WHERE label = '#b'", [])
            .unwrap();

        assert!(store.list_edges().unwrap().is_empty());
    }

    #[test]
    fn test_failed_edge_creation_rolls_back() {
        let store = create_test_store();
        store.upsert_node("#a", 1).unwrap();

        let err = store.upsert_edge("#a", "#missing", 1).unwrap_err();
        assert!(matches!(err, StorageError::MissingNode(ref l) if l == "#missing"));

        assert!(store.list_edges().unwrap().is_empty());
        assert_eq!(store.list_nodes().unwrap().len(), 1);
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("topics.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            create_linked_pair(&store, "#berlin", "#beer");
            store.upsert_node("#berlin", 1).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.find_node("#berlin").unwrap().unwrap().weight, 2);
        assert!(store.edge_exists("#beer", "#berlin").unwrap());
    }

    #[test]
    fn test_backup_to_writes_readable_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("live.db")).unwrap();
        create_linked_pair(&store, "#python", "#databases");

        let backup_path = dir.path().join("backups").join("copy.db");
        store.backup_to(&backup_path).unwrap();

        let copy = SqliteStore::open(&backup_path).unwrap();
        assert_eq!(copy.list_nodes().unwrap().len(), 2);
        assert!(copy.edge_exists("#databases", "#python").unwrap());
    }

    #[test]
    fn test_backup_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let store = create_test_store();
        let target = dir.path().join("taken.db");
        std::fs::write(&target, b"not a database").unwrap();

        assert!(store.backup_to(&target).is_err());
    }
}
