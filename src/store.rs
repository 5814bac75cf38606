use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::models::AnalysisResult;

/// Well-known key the bulk snapshot lives under. There is exactly one
/// snapshot at a time; a new successful bulk run overwrites it in full.
pub const SNAPSHOT_KEY: &str = "analysis_results";

/// Durable, session-scoped store for the bulk analysis snapshot. Lives under
/// the user's runtime directory so it goes away with the session rather than
/// accumulating forever; the application itself never deletes it, only
/// overwrites it.
pub struct SnapshotStore {
    conn: Connection,
    path: PathBuf,
}

impl SnapshotStore {
    pub fn open() -> Result<Self> {
        Self::open_at(Self::default_path())
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        let store = Self { conn, path };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "prospect") {
            proj_dirs
                .runtime_dir()
                .unwrap_or_else(|| proj_dirs.cache_dir())
                .join("session.db")
        } else {
            PathBuf::from("prospect-session.db")
        }
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// Reads the stored snapshot, or None when no bulk run has completed in
    /// this session. The returned copy is point-in-time; it does not observe
    /// later writes unless re-read.
    pub fn load(&self) -> Result<Option<Vec<AnalysisResult>>> {
        let payload: Option<String> = match self.conn.query_row(
            "SELECT payload FROM snapshots WHERE key = ?1",
            [SNAPSHOT_KEY],
            |row| row.get(0),
        ) {
            Ok(payload) => Some(payload),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Replaces the snapshot in full. Never appends, never merges.
    pub fn save(&self, results: &[AnalysisResult]) -> Result<()> {
        let payload = serde_json::to_string(results)?;
        self.conn.execute(
            "INSERT INTO snapshots (key, payload, saved_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at",
            rusqlite::params![SNAPSHOT_KEY, payload],
        )?;
        debug!(count = results.len(), path = %self.path.display(), "snapshot written");
        Ok(())
    }

    /// Raw payload text, used to check that a failed run left the snapshot
    /// untouched.
    #[cfg(test)]
    pub fn raw_payload(&self) -> Result<Option<String>> {
        match self.conn.query_row(
            "SELECT payload FROM snapshots WHERE key = ?1",
            [SNAPSHOT_KEY],
            |row| row.get(0),
        ) {
            Ok(payload) => Ok(Some(payload)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
