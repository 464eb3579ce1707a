//! SQLite-backed expand state, one database per site root.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};

mod migrations;

use migrations::run_migrations;
use crate::toc::StateStorage;

pub const STATE_DIR: &str = ".thesis-site";
pub const STATE_FILE: &str = "state.sqlite3";

pub struct StateDatabase {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl StateDatabase {
    /// Default location of the state database for a site root.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(STATE_FILE)
    }

    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create state directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open state database {}", db_path.display()))?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }

        let db = Self::init(conn, Some(db_path))?;
        if let Some(path) = db.path() {
            info!("State database ready at {}", path.display());
        }
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init(conn, None)
    }

    fn init(mut conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        run_migrations(&mut conn).context("failed to run state database migrations")?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("state database connection poisoned"))
    }

    /// All stored flags, ordered by key.
    pub fn entries(&self) -> Result<Vec<(String, bool)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, expanded FROM expand_state ORDER BY key ASC")?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push((row.get::<_, String>(0)?, row.get::<_, bool>(1)?));
        }
        Ok(entries)
    }
}

impl StateStorage for StateDatabase {
    fn get(&self, key: &str) -> Result<Option<bool>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT expanded FROM expand_state WHERE key = ?1",
            params![key],
            |row| row.get::<_, bool>(0),
        )
        .optional()
        .with_context(|| format!("failed to read expand state for {key}"))
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO expand_state (key, expanded, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 expanded = excluded.expanded,
                 updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("failed to store expand state for {key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::{ExpandStateStore, NodeKey};
    use chrono::NaiveDate;

    #[test]
    fn get_set_overwrites() {
        let db = StateDatabase::open_in_memory().unwrap();
        assert_eq!(db.get("toc-year-2024").unwrap(), None);

        db.set("toc-year-2024", true).unwrap();
        db.set("toc-year-2024", false).unwrap();
        db.set("toc-month-2024-March", true).unwrap();

        assert_eq!(db.get("toc-year-2024").unwrap(), Some(false));
        assert_eq!(
            db.entries().unwrap(),
            vec![
                ("toc-month-2024-March".to_string(), true),
                ("toc-year-2024".to_string(), false),
            ]
        );
    }

    #[test]
    fn state_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = StateDatabase::default_path(dir.path());
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        {
            let db = StateDatabase::open(path.clone()).unwrap();
            let store = ExpandStateStore::with_today(db, today);
            store.set_expanded(NodeKey::Year(2019), true).unwrap();
        }

        let reopened = ExpandStateStore::with_today(StateDatabase::open(path).unwrap(), today);
        assert!(reopened.is_expanded(NodeKey::Year(2019)));
        assert!(!reopened.is_expanded(NodeKey::Year(2020)));
    }
}
