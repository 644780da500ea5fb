//! Persistence for signal-diary.
//!
//! The stores never talk to a database directly. They go through
//! [`RecordStore`], a narrow read/write port over keyed text blobs, so they
//! can be built and tested without any host environment. Two adapters are
//! provided: [`SqliteStore`] for real use and [`MemoryStore`] for tests and
//! embedding.

pub mod migrations;
pub mod schema;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Record key holding the serialized entry list.
pub const ENTRIES_KEY: &str = "signal-diary-logs";

/// Record key holding the serialized user profile.
pub const PROFILE_KEY: &str = "signal-diary-profile";

/// Narrow persistence port over keyed text records.
///
/// Implementations must be synchronous: when `write` returns `Ok`, the
/// value is durable as far as the medium allows. Failures are reported,
/// never swallowed.
pub trait RecordStore {
    /// Read the record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Erase the record stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Rc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// `SQLite`-backed record store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps readers from blocking the single writer.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory database, mostly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let record_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

        let last_updated: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM records ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let last_updated = last_updated
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            record_count,
            last_updated,
            db_size_bytes,
        })
    }
}

impl RecordStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM records WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        debug!(key, bytes = value.len(), "Record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM records WHERE key = ?1", [key])?;
        debug!(key, affected, "Record removed");
        Ok(())
    }
}

/// Statistics about the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keyed records stored.
    pub record_count: i64,
    /// When any record was last written.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records.borrow().contains_key(key)
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.records.borrow_mut().remove(key);
        Ok(())
    }
}
