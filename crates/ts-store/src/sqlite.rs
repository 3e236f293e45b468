//! SQLite store backend (feature `sqlite`).
//!
//! One `documents` table holds every collection.  The index columns are
//! decoded and filtered in Rust; bodies are JSON text.  Commits run inside
//! an `IMMEDIATE` SQLite transaction so validation and writes are atomic
//! with respect to other processes sharing the file.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::txn::{Backend, OptimisticTx, TxLog, Versioned};
use crate::{Collection, DocIndex, Query, RawDoc, Store, StoreResult, Transaction};

/// A [`Store`] persisted in a single SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS documents (
                 collection TEXT    NOT NULL,
                 key        TEXT    NOT NULL,
                 version    INTEGER NOT NULL,
                 idx        TEXT    NOT NULL,
                 body       TEXT    NOT NULL,
                 PRIMARY KEY (collection, key)
             );
             CREATE TABLE IF NOT EXISTS meta (
                 id           INTEGER PRIMARY KEY CHECK (id = 0),
                 next_version INTEGER NOT NULL
             );
             INSERT OR IGNORE INTO meta (id, next_version) VALUES (0, 1);",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode(version: i64, idx: &str, body: &str) -> StoreResult<Versioned> {
    let index: DocIndex = serde_json::from_str(idx)?;
    let body = serde_json::from_str(body)?;
    Ok(Versioned { version: version as u64, doc: RawDoc { index, body } })
}

fn read_one(conn: &Connection, collection: Collection, key: &str) -> StoreResult<Option<Versioned>> {
    let row = conn
        .prepare_cached("SELECT version, idx, body FROM documents WHERE collection = ?1 AND key = ?2")?
        .query_row(rusqlite::params![collection.as_str(), key], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?))
        })
        .optional()?;
    row.map(|(v, idx, body)| decode(v, &idx, &body)).transpose()
}

fn scan_all(conn: &Connection, collection: Collection, query: &Query) -> StoreResult<Vec<(String, Versioned)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT key, version, idx, body FROM documents WHERE collection = ?1 ORDER BY key",
    )?;
    let rows = stmt.query_map(rusqlite::params![collection.as_str()], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (key, version, idx, body) = row?;
        let doc = decode(version, &idx, &body)?;
        if query.matches(&doc.doc.index) {
            out.push((key, doc));
        }
    }
    Ok(out)
}

impl Backend for SqliteStore {
    fn read(&self, collection: Collection, key: &str) -> StoreResult<Option<Versioned>> {
        read_one(&self.lock(), collection, key)
    }

    fn scan(&self, collection: Collection, query: &Query) -> StoreResult<Vec<(String, Versioned)>> {
        scan_all(&self.lock(), collection, query)
    }

    fn apply(&self, log: TxLog) -> StoreResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        log.validate(
            |c, k| Ok(read_one(&tx, c, k)?.map(|v| v.version)),
            |c, q| Ok(scan_all(&tx, c, q)?.into_iter().map(|(k, v)| (k, v.version)).collect()),
        )?;

        let mut version: i64 = tx.query_row("SELECT next_version FROM meta WHERE id = 0", [], |r| r.get(0))?;
        let writes = log.writes.len();
        {
            let mut upsert = tx.prepare_cached(
                "INSERT INTO documents (collection, key, version, idx, body) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT (collection, key) DO UPDATE SET \
                 version = excluded.version, idx = excluded.idx, body = excluded.body",
            )?;
            let mut delete = tx.prepare_cached(
                "DELETE FROM documents WHERE collection = ?1 AND key = ?2",
            )?;
            for ((collection, key), pending) in &log.writes {
                match pending {
                    Some(doc) => {
                        upsert.execute(rusqlite::params![
                            collection.as_str(),
                            key,
                            version,
                            serde_json::to_string(&doc.index)?,
                            serde_json::to_string(&doc.body)?,
                        ])?;
                    }
                    None => {
                        delete.execute(rusqlite::params![collection.as_str(), key])?;
                    }
                }
                version += 1;
            }
        }
        tx.execute("UPDATE meta SET next_version = ?1 WHERE id = 0", rusqlite::params![version])?;
        tx.commit()?;
        debug!(writes, "sqlite commit applied");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        Ok(Box::new(OptimisticTx::new(self)))
    }
}
