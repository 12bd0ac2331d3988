//! Relational schema for the snapshot store.

pub(crate) const CREATE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS entities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        ticker TEXT NOT NULL UNIQUE,
        url TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS financial_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id INTEGER NOT NULL REFERENCES entities(id),
        recorded_at TEXT NOT NULL,
        per REAL,
        bpa REAL,
        ebitda REAL,
        beneficio REAL,
        deuda REAL
    );

    CREATE INDEX IF NOT EXISTS idx_snapshots_entity
        ON financial_snapshots(entity_id, id);
"#;

pub(crate) const INSERT_ENTITY: &str =
    "INSERT OR IGNORE INTO entities (name, ticker, url) VALUES (?1, ?2, ?3)";

pub(crate) const SELECT_ENTITY_ID: &str = "SELECT id FROM entities WHERE ticker = ?1";

pub(crate) const INSERT_SNAPSHOT: &str = "INSERT INTO financial_snapshots \
     (entity_id, recorded_at, per, bpa, ebitda, beneficio, deuda) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// One row per entity carrying its most recent snapshot, or nulls.
pub(crate) const SELECT_JOINED: &str = r#"
    SELECT e.id, e.name, e.ticker, s.recorded_at,
           s.per, s.bpa, s.ebitda, s.beneficio, s.deuda
    FROM entities e
    LEFT JOIN financial_snapshots s
      ON s.id = (SELECT MAX(id) FROM financial_snapshots WHERE entity_id = e.id)
    ORDER BY e.id
"#;
