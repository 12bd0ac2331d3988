//! Shared snapshot store over SQLite.
//!
//! Any number of threads may hold their own connection. Statements that
//! mutate the database (entity registration and snapshot appends) run inside
//! a critical section owned by the `SharedStore` instance, so every writer of
//! one file must go through the same instance (one store per run). Separate
//! instances over the same file only rely on SQLite's busy timeout. Reads take
//! no lock.

mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::domain::{Entity, EntityId, FieldMap, FinancialSnapshot};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot prepare store directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entity '{ticker}' vanished after registration")]
    EntityMissing { ticker: String },

    #[error("store write lock poisoned by a panicked writer")]
    LockPoisoned,
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        "store_write"
    }
}

/// Write side of the store, as seen by collection tasks.
pub trait SnapshotWriter: Send + Sync {
    /// Idempotent: the same ticker always yields the same id.
    fn resolve_or_create_entity_id(&self, entity: &Entity) -> Result<EntityId, StoreError>;

    /// Append one snapshot. The append is atomic from the caller's view.
    fn append_snapshot(
        &self,
        entity_id: EntityId,
        snapshot: &FinancialSnapshot,
    ) -> Result<i64, StoreError>;
}

/// An entity joined with its most recent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedSnapshotRow {
    pub entity_id: EntityId,
    pub name: String,
    pub ticker: String,
    /// `None` when the entity has no snapshot yet.
    pub recorded_at: Option<String>,
    pub fields: FieldMap,
}

/// Thread-safe persistence facade over one SQLite file.
///
/// Share one instance (by reference or `Arc`) among all writers of the file.
#[derive(Debug)]
pub struct SharedStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    busy_timeout: Duration,
}

impl SharedStore {
    /// Open (creating if needed) the store at `path` and ensure its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
        let store = Self { path, write_lock: Mutex::new(()), busy_timeout: DEFAULT_BUSY_TIMEOUT };
        store.ensure_schema()?;
        tracing::debug!(path = %store.path.display(), "snapshot store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the tables if they do not exist yet.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let _guard = self.lock()?;
        conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// Open a fresh connection. Callers may hold one per thread.
    pub fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Register every entity in order, returning their ids in the same order.
    pub fn register_entities(&self, entities: &[Entity]) -> Result<Vec<EntityId>, StoreError> {
        entities.iter().map(|e| self.resolve_or_create_entity_id(e)).collect()
    }

    /// Every registered entity with its latest snapshot, ordered by entity id.
    pub fn query_joined_snapshots(&self) -> Result<Vec<JoinedSnapshotRow>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(schema::SELECT_JOINED)?;
        let rows = stmt.query_map([], |row| {
            Ok(JoinedSnapshotRow {
                entity_id: EntityId(row.get(0)?),
                name: row.get(1)?,
                ticker: row.get(2)?,
                recorded_at: row.get(3)?,
                fields: FieldMap {
                    per: row.get(4)?,
                    bpa: row.get(5)?,
                    ebitda: row.get(6)?,
                    beneficio: row.get(7)?,
                    deuda: row.get(8)?,
                },
            })
        })?;
        let joined = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(joined)
    }

    pub fn entity_count(&self) -> Result<usize, StoreError> {
        self.count("SELECT COUNT(*) FROM entities")
    }

    pub fn snapshot_count(&self) -> Result<usize, StoreError> {
        self.count("SELECT COUNT(*) FROM financial_snapshots")
    }

    fn count(&self, sql: &str) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl SnapshotWriter for SharedStore {
    fn resolve_or_create_entity_id(&self, entity: &Entity) -> Result<EntityId, StoreError> {
        let conn = self.connect()?;
        let _guard = self.lock()?;
        // First writer wins; later attempts fall through to the lookup.
        conn.execute(schema::INSERT_ENTITY, params![entity.name, entity.ticker, entity.url])?;
        let id: Option<i64> = conn
            .query_row(schema::SELECT_ENTITY_ID, params![entity.ticker], |row| row.get(0))
            .optional()?;
        id.map(EntityId)
            .ok_or_else(|| StoreError::EntityMissing { ticker: entity.ticker.clone() })
    }

    fn append_snapshot(
        &self,
        entity_id: EntityId,
        snapshot: &FinancialSnapshot,
    ) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        let f = &snapshot.fields;
        let _guard = self.lock()?;
        conn.execute(
            schema::INSERT_SNAPSHOT,
            params![entity_id.0, snapshot.recorded_at, f.per, f.bpa, f.ebitda, f.beneficio, f.deuda],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
