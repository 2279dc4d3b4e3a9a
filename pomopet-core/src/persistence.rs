//! Persistence collaborators for the pet registry.
//!
//! The registry never waits on storage. It hands each change to a
//! [`PersistSink`] and moves on; sinks log failures and never report them
//! back, so the in-memory state stays authoritative until the next
//! successful save.
//!
//! Stores:
//! - [`MemoryStore`] — process-local map, stands in for the external
//!   document store.
//! - [`SqliteStore`] — one JSON blob per pet in a local SQLite file:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS pets (
//!     pet_id     TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! Sinks:
//! - [`InlineSink`] — applies each operation on the caller's thread.
//! - [`PersistQueue`] — forwards operations to a tokio worker that runs them
//!   on the blocking pool. The backlog is bounded; overflow is logged and
//!   dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, params};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{PersistenceConfig, StoreBackend};
use crate::error::{PetError, Result};
use crate::types::{PetId, PetSnapshot};

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Storage for pet snapshots.
pub trait PetStore: Send + Sync {
    /// Save (upsert) a pet.
    ///
    /// # Errors
    /// Backend-specific failures.
    fn save(&self, snapshot: &PetSnapshot) -> Result<()>;

    /// Delete a pet. Returns `true` if something was deleted.
    ///
    /// # Errors
    /// Backend-specific failures.
    fn delete(&self, id: PetId) -> Result<bool>;

    /// Load every saved pet.
    ///
    /// # Errors
    /// Backend-specific failures.
    fn load_all(&self) -> Result<Vec<PetSnapshot>>;
}

/// Open the store selected by `config`.
///
/// # Errors
/// Returns [`PetError::Database`] if the SQLite file cannot be opened.
pub fn open_store(config: &PersistenceConfig) -> Result<Arc<dyn PetStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.path, config)?)),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pets: Mutex<HashMap<PetId, PetSnapshot>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one saved pet.
    #[must_use]
    pub fn get(&self, id: PetId) -> Option<PetSnapshot> {
        self.pets.lock().get(&id).cloned()
    }

    /// Number of saved pets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pets.lock().len()
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pets.lock().is_empty()
    }
}

impl PetStore for MemoryStore {
    fn save(&self, snapshot: &PetSnapshot) -> Result<()> {
        self.pets.lock().insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    fn delete(&self, id: PetId) -> Result<bool> {
        Ok(self.pets.lock().remove(&id).is_some())
    }

    fn load_all(&self) -> Result<Vec<PetSnapshot>> {
        Ok(self.pets.lock().values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS pets (
    pet_id     TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// SQLite-backed store. The connection is serialized behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    /// Returns [`PetError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Pet store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    /// Returns [`PetError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            checksum_enabled: config.checksum_enabled,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of saved pets.
    ///
    /// # Errors
    /// Returns [`PetError::Database`] on SQLite failures.
    pub fn pet_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn decode(&self, pet_id: &str, data: &[u8], checksum: Option<&str>) -> Result<PetSnapshot> {
        if self.checksum_enabled {
            if let Some(expected) = checksum {
                let actual = crc32_hex(data);
                if expected != actual {
                    warn!(
                        pet = %pet_id,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch — possible save corruption"
                    );
                }
            }
        }
        serde_json::from_slice(data).map_err(|e| PetError::Serialization(e.to_string()))
    }
}

impl PetStore for SqliteStore {
    fn save(&self, snapshot: &PetSnapshot) -> Result<()> {
        let start = Instant::now();
        let json =
            serde_json::to_vec(snapshot).map_err(|e| PetError::Serialization(e.to_string()))?;
        let checksum = self.checksum_enabled.then(|| crc32_hex(&json));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO pets (pet_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(pet_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![snapshot.id.0.to_string(), json, now, checksum],
        )?;

        debug!(
            pet = %snapshot.id,
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved pet"
        );
        Ok(())
    }

    fn delete(&self, id: PetId) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM pets WHERE pet_id = ?1", params![id.0.to_string()])?;
        Ok(deleted > 0)
    }

    fn load_all(&self) -> Result<Vec<PetSnapshot>> {
        let rows: Vec<(String, Vec<u8>, Option<String>)> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare_cached("SELECT pet_id, data, checksum FROM pets")?;
            let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
            mapped.collect::<std::result::Result<_, _>>()?
        };

        let mut pets = Vec::with_capacity(rows.len());
        for (pet_id, data, checksum) in rows {
            match self.decode(&pet_id, &data, checksum.as_deref()) {
                Ok(snapshot) => pets.push(snapshot),
                Err(e) => warn!(pet = %pet_id, error = %e, "Skipping unreadable pet row"),
            }
        }
        Ok(pets)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// One unit of persistence work.
#[derive(Debug, Clone)]
pub enum PersistOp {
    /// Upsert this snapshot.
    Save(PetSnapshot),
    /// Delete this pet.
    Delete(PetId),
}

impl PersistOp {
    /// The pet this operation targets.
    #[must_use]
    pub fn pet_id(&self) -> PetId {
        match self {
            Self::Save(snapshot) => snapshot.id,
            Self::Delete(id) => *id,
        }
    }

    /// Run against `store`, logging (not returning) any failure.
    pub fn apply(&self, store: &dyn PetStore) {
        let result = match self {
            Self::Save(snapshot) => store.save(snapshot),
            Self::Delete(id) => store.delete(*id).map(|_| ()),
        };
        if let Err(e) = result {
            warn!(pet = %self.pet_id(), error = %e, "Persistence failed; in-memory state kept");
        }
    }
}

/// Fire-and-forget destination for registry changes.
pub trait PersistSink: Send + Sync {
    /// Hand over one operation. Must not block on storage I/O for long and
    /// must never fail the caller.
    fn submit(&self, op: PersistOp);
}

/// Applies each operation immediately on the caller's thread.
pub struct InlineSink {
    store: Arc<dyn PetStore>,
}

impl InlineSink {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn PetStore>) -> Self {
        Self { store }
    }
}

impl PersistSink for InlineSink {
    fn submit(&self, op: PersistOp) {
        op.apply(self.store.as_ref());
    }
}

/// Queues operations for a background worker.
#[derive(Clone)]
pub struct PersistQueue {
    tx: mpsc::Sender<PersistOp>,
    dropped: Arc<AtomicU64>,
}

impl PersistQueue {
    /// Spawn the worker on the current tokio runtime, holding at most
    /// `capacity` pending operations (minimum 1).
    ///
    /// The worker exits once every `PersistQueue` clone is dropped and the
    /// backlog is drained.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(store: Arc<dyn PetStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<PersistOp>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                let store = Arc::clone(&store);
                let pet = op.pet_id();
                let applied = tokio::task::spawn_blocking(move || op.apply(store.as_ref()));
                if let Err(e) = applied.await {
                    warn!(pet = %pet, error = %e, "Persistence task aborted");
                }
            }
            debug!("Persistence worker stopped");
        });
        let queue = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (queue, handle)
    }

    /// Operations discarded because the backlog was full or the worker was
    /// gone.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl PersistSink for PersistQueue {
    fn submit(&self, op: PersistOp) {
        match self.tx.try_send(op) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(op)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    pet = %op.pet_id(),
                    dropped,
                    "Persistence backlog full; dropping operation"
                );
            }
            Err(mpsc::error::TrySendError::Closed(op)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(pet = %op.pet_id(), "Persistence worker gone; dropping operation");
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PersistSink for NullSink {
    fn submit(&self, _op: PersistOp) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
