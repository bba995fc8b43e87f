//! Persistence of the performance profile and the completed-session log.
//!
//! Entities are stored as JSON blobs under fixed keys so any key/value medium
//! can back them; SQLite is the one the binary uses.

use crate::app_dirs::AppDirs;
use crate::result::SessionResult;
use crate::stats::{aggregate, UserStats};
use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const USER_STATS_KEY: &str = "typewise:user-stats";
pub const LAST_RESULT_KEY: &str = "typewise:last-result";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// String blobs under string keys
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Open the database under the application state dir
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("typewise_stats.db"));
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "opening blob store");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM blobs WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// Typed access to the profile and the latest result on top of a [`BlobStore`]
pub struct StatsRepository<S> {
    store: S,
}

impl<S: BlobStore> StatsRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The stored profile, or an empty one if nothing was saved yet
    pub fn load_stats(&self) -> Result<UserStats> {
        match self.store.get(USER_STATS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(UserStats::default()),
        }
    }

    pub fn save_stats(&mut self, stats: &UserStats) -> Result<()> {
        let json = serde_json::to_string(stats)?;
        self.store.put(USER_STATS_KEY, &json)
    }

    pub fn last_result(&self) -> Result<Option<SessionResult>> {
        self.store
            .get(LAST_RESULT_KEY)?
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    /// Fold `result` into the stored profile and persist both
    pub fn record(&mut self, result: &SessionResult) -> Result<UserStats> {
        let stats = aggregate(&self.load_stats()?, result);
        self.save_stats(&stats)?;
        self.store
            .put(LAST_RESULT_KEY, &serde_json::to_string(result)?)?;
        tracing::info!(session = %result.id, "session recorded");
        Ok(stats)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.delete(USER_STATS_KEY)?;
        self.store.delete(LAST_RESULT_KEY)
    }
}

/// One row of the CSV session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogRow {
    pub date: String,
    pub content_type: String,
    pub error_mode: String,
    pub text_length: usize,
    pub elapsed_secs: String,
    pub gross_wpm: u32,
    pub net_wpm: u32,
    pub accuracy: u32,
    pub mistakes: u32,
}

impl From<&SessionResult> for SessionLogRow {
    fn from(result: &SessionResult) -> Self {
        let date = DateTime::<Utc>::from_timestamp_millis(result.completed_at)
            .map(|d| d.with_timezone(&Local).format("%c").to_string())
            .unwrap_or_default();
        Self {
            date,
            content_type: result.content_type.to_string(),
            error_mode: result.error_mode.to_string(),
            text_length: result.text_length,
            elapsed_secs: format!("{:.2}", result.duration_secs()),
            gross_wpm: result.gross_wpm,
            net_wpm: result.net_wpm,
            accuracy: result.accuracy,
            mistakes: result.mistakes,
        }
    }
}

/// Append-only CSV history of completed sessions
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Option<Self> {
        AppDirs::session_log_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, result: &SessionResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, the writer emits a header
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(SessionLogRow::from(result))?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<SessionLogRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<SessionLogRow>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ContentType;
    use crate::session::{Keystroke, PracticeSession, SessionConfig};
    use crate::state::ErrorMode;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn completed_result(keys: &str) -> SessionResult {
        let mut session = PracticeSession::new(
            "ab",
            SessionConfig {
                error_mode: ErrorMode::StopOnError,
                ..SessionConfig::default()
            },
        );
        for (i, c) in keys.chars().enumerate() {
            session.press(Keystroke::Char(c), 1_000 + i as i64 * 200);
        }
        session.result().cloned().expect("session should complete")
    }

    fn exercise_blob_store(store: &mut impl BlobStore) {
        assert_eq!(store.get("missing").unwrap(), None);
        store.put("k", "v1").unwrap();
        store.put("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_blob_store() {
        exercise_blob_store(&mut SqliteBlobStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_memory_blob_store() {
        exercise_blob_store(&mut MemoryBlobStore::default());
    }

    #[test]
    fn test_sqlite_store_persists_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.db");

        let mut store = SqliteBlobStore::open(&path).unwrap();
        store.put(USER_STATS_KEY, "{}").unwrap();
        drop(store);

        let store = SqliteBlobStore::open(&path).unwrap();
        assert_eq!(store.get(USER_STATS_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_repository_record_roundtrip() {
        let mut repo = StatsRepository::new(SqliteBlobStore::open_in_memory().unwrap());
        assert_eq!(repo.load_stats().unwrap(), UserStats::default());
        assert!(repo.last_result().unwrap().is_none());

        let result = completed_result("xab");
        let stats = repo.record(&result).unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert!(stats.key_stats.contains_key(&'a'));

        assert_eq!(repo.load_stats().unwrap(), stats);
        assert_eq!(repo.last_result().unwrap(), Some(result));

        repo.clear().unwrap();
        assert_eq!(repo.load_stats().unwrap(), UserStats::default());
    }

    #[test]
    fn test_repository_rejects_corrupt_blob() {
        let mut store = MemoryBlobStore::default();
        store.put(USER_STATS_KEY, "not json").unwrap();
        let repo = StatsRepository::new(store);
        assert_matches!(repo.load_stats(), Err(StoreError::Json(_)));
    }

    #[test]
    fn test_session_log_appends_with_single_header() {
        let dir = tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("log.csv"));
        assert!(log.read_all().unwrap().is_empty());

        log.append(&completed_result("ab")).unwrap();
        log.append(&completed_result("xab")).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.matches("net_wpm").count(), 1);

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mistakes, 0);
        assert_eq!(rows[1].mistakes, 1);
        assert_eq!(rows[1].error_mode, "stop-on-error");
        assert_eq!(rows[1].content_type, ContentType::Words.to_string());
    }
}
