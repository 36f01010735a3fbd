//! SQLite-backed key-existence store
//!
//! Keys and values are raw bytes; typed string/JSON accessors are layered on
//! top. Existence is the signal - values are opaque markers.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache is read-only")]
    ReadOnly,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Options controlling how the cache is opened
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Open without write access; mutations return [`CacheError::ReadOnly`]
    pub read_only: bool,

    /// Drop any existing entries and start empty
    pub wipe: bool,

    /// Advisory cap on the on-disk size, bytes
    pub max_size_bytes: Option<u64>,
}

/// Durable dedup cache
///
/// A single-writer, multi-reader key-value store with append-only set
/// semantics on the crawl's hot path: entries are created when a record is
/// claimed for processing and are never updated. The store survives process
/// restarts; reopening against an existing database is the default.
pub struct DedupCache {
    conn: Mutex<Connection>,
    read_only: bool,
}

const DB_FILE: &str = "dedup.db";
const SQLITE_PAGE_SIZE: u64 = 4096;

impl DedupCache {
    /// Opens (or creates) the cache inside the given directory
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the database file; created if missing
    /// * `options` - Open options (read-only, wipe, size cap)
    ///
    /// # Returns
    ///
    /// * `Ok(DedupCache)` - Successfully opened store
    /// * `Err(CacheError)` - Failed to open or initialize
    pub fn open(dir: &Path, options: CacheOptions) -> CacheResult<Self> {
        std::fs::create_dir_all(dir)?;
        let db_path: PathBuf = dir.join(DB_FILE);

        if options.wipe && db_path.exists() {
            std::fs::remove_file(&db_path)?;
        }

        let conn = if options.read_only {
            Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
        } else {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
            ",
            )?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS entries (
                    key   BLOB PRIMARY KEY,
                    value BLOB NOT NULL
                )",
                [],
            )?;
            if let Some(max_bytes) = options.max_size_bytes {
                let pages = (max_bytes / SQLITE_PAGE_SIZE).max(1);
                conn.pragma_update(None, "max_page_count", pages)?;
            }
            conn
        };

        Ok(Self {
            conn: Mutex::new(conn),
            read_only: options.read_only,
        })
    }

    fn guard_writable(&self) -> CacheResult<()> {
        if self.read_only {
            return Err(CacheError::ReadOnly);
        }
        Ok(())
    }

    // ===== Raw byte operations =====

    /// Returns true if the key is present
    pub fn exists(&self, key: &[u8]) -> CacheResult<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Stores a key-value pair, overwriting any existing value
    pub fn set(&self, key: &[u8], value: &[u8]) -> CacheResult<()> {
        self.guard_writable()?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Inserts the key only if it is absent
    ///
    /// This is the atomic claim primitive used as the dedup gate: exactly one
    /// of any number of concurrent callers observes `true` for a given key.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The key was absent and has been inserted by this call
    /// * `Ok(false)` - The key was already present; nothing was written
    pub fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> CacheResult<bool> {
        self.guard_writable()?;
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO entries (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(inserted > 0)
    }

    /// Removes a key, returning whether it was present
    ///
    /// Used only to release a claim whose fetch exhausted its attempt budget;
    /// successful entries are never removed.
    pub fn remove(&self, key: &[u8]) -> CacheResult<bool> {
        self.guard_writable()?;
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Gets the raw value for a key
    pub fn get(&self, key: &[u8]) -> CacheResult<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        let value: Option<Vec<u8>> = conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    // ===== Bulk enumeration =====

    /// Returns all keys in ascending byte order
    pub fn keys(&self) -> CacheResult<Vec<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }

    /// Returns all (key, value) pairs in ascending key order
    pub fn items(&self) -> CacheResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM entries ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    /// Returns the number of entries
    pub fn count(&self) -> CacheResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Drops all entries
    ///
    /// Used only in test/reset flows, never on the crawl's hot path.
    pub fn clear(&self) -> CacheResult<()> {
        self.guard_writable()?;
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    // ===== Typed convenience accessors =====

    /// Stores a UTF-8 string value under a string key
    pub fn put_string(&self, key: &str, value: &str) -> CacheResult<()> {
        self.set(key.as_bytes(), value.as_bytes())
    }

    /// Gets a UTF-8 string value; non-UTF-8 bytes are replaced
    pub fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self
            .get(key.as_bytes())?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Stores a JSON-serializable value under a string key
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key.as_bytes(), &bytes)
    }

    /// Gets and deserializes a JSON value
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
