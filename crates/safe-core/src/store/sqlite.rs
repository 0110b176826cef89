//! SQLite-backed store.
//!
//! Schema:
//! ```sql
//! meta(key TEXT PRIMARY KEY, value TEXT NOT NULL)   -- PASSWORD_HASH, format_version
//! tracked_files(path TEXT PRIMARY KEY, added_at TEXT NOT NULL)
//! ```
//!
//! The database holds no secrets (only the verification hash and file paths),
//! so it is stored unencrypted with owner-only permissions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::traits::{FileRegistry, PasswordStore};
use super::types::TrackedFile;
use crate::error::{Result, SafeError};

const PASSWORD_HASH_KEY: &str = "PASSWORD_HASH";
const FORMAT_VERSION: &str = "1";

/// Store persisted in a SQLite database file.
pub struct SqliteStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `path`, creating the file and schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let existed = path.exists();
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tracked_files (
                path TEXT PRIMARY KEY,
                added_at TEXT NOT NULL
            );
            "#,
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES (?, ?)",
            ["format_version", FORMAT_VERSION],
        )?;

        if !existed {
            crate::fs::set_private_permissions(path)?;
            tracing::debug!(path = %path.display(), "created store");
        }

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_text(path: &Path) -> Result<&str> {
        path.to_str()
            .ok_or_else(|| SafeError::Store(format!("Path is not valid UTF-8: {}", path.display())))
    }
}

impl PasswordStore for SqliteStore {
    fn get_hash(&self) -> Result<String> {
        self.conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?",
                [PASSWORD_HASH_KEY],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(SafeError::PasswordNotSet)
    }

    fn set_hash(&mut self, hash: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![PASSWORD_HASH_KEY, hash],
        )?;
        Ok(())
    }
}

impl FileRegistry for SqliteStore {
    fn track(&mut self, path: &Path) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO tracked_files (path, added_at) VALUES (?, ?)",
            params![Self::path_text(path)?, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    fn untrack(&mut self, path: &Path) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM tracked_files WHERE path = ?",
            [Self::path_text(path)?],
        )?;
        Ok(removed > 0)
    }

    fn tracked(&self) -> Result<Vec<TrackedFile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, added_at FROM tracked_files ORDER BY path")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut files = Vec::new();
        for row in rows {
            let (path, added_at) = row?;
            let added_at = DateTime::parse_from_rfc3339(&added_at)
                .map_err(|e| SafeError::Store(format!("Invalid timestamp: {}", e)))?
                .with_timezone(&Utc);
            files.push(TrackedFile {
                path: PathBuf::from(path),
                added_at,
            });
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("safe.db");

        let store = SqliteStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert!(!store.is_initialized().unwrap());
    }

    #[test]
    fn test_hash_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("safe.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set_hash("abc").unwrap();
            store.set_hash("def").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_hash().unwrap(), "def");
    }

    #[test]
    fn test_tracked_files_roundtrip() {
        let dir = tempdir().unwrap();
        let mut store = SqliteStore::open(&dir.path().join("safe.db")).unwrap();

        assert!(store.track(Path::new("/tmp/b.txt.safe")).unwrap());
        assert!(store.track(Path::new("/tmp/a.txt.safe")).unwrap());
        assert!(!store.track(Path::new("/tmp/a.txt.safe")).unwrap());

        let tracked = store.tracked().unwrap();
        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked[0].path, PathBuf::from("/tmp/a.txt.safe"));

        assert!(store.untrack(Path::new("/tmp/a.txt.safe")).unwrap());
        assert!(!store.untrack(Path::new("/tmp/a.txt.safe")).unwrap());
        assert_eq!(store.tracked().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_database_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("safe.db");

        SqliteStore::open(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
