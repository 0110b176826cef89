//! In-process store, used by tests and dry runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::traits::{FileRegistry, PasswordStore};
use super::types::TrackedFile;
use crate::error::{Result, SafeError};

/// Store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hash: Option<String>,
    files: BTreeMap<PathBuf, DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordStore for MemoryStore {
    fn get_hash(&self) -> Result<String> {
        self.hash.clone().ok_or(SafeError::PasswordNotSet)
    }

    fn set_hash(&mut self, hash: &str) -> Result<()> {
        self.hash = Some(hash.to_string());
        Ok(())
    }
}

impl FileRegistry for MemoryStore {
    fn track(&mut self, path: &Path) -> Result<bool> {
        if self.files.contains_key(path) {
            return Ok(false);
        }
        self.files.insert(path.to_path_buf(), Utc::now());
        Ok(true)
    }

    fn untrack(&mut self, path: &Path) -> Result<bool> {
        Ok(self.files.remove(path).is_some())
    }

    fn tracked(&self) -> Result<Vec<TrackedFile>> {
        Ok(self
            .files
            .iter()
            .map(|(path, added_at)| TrackedFile {
                path: path.clone(),
                added_at: *added_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_hash() {
        let store = MemoryStore::new();
        assert!(matches!(store.get_hash(), Err(SafeError::PasswordNotSet)));
        assert!(!store.is_initialized().unwrap());
    }

    #[test]
    fn test_track_is_idempotent() {
        let mut store = MemoryStore::new();
        assert!(store.track(Path::new("/b.safe")).unwrap());
        assert!(store.track(Path::new("/a.safe")).unwrap());
        assert!(!store.track(Path::new("/a.safe")).unwrap());

        let paths: Vec<_> = store.tracked().unwrap().into_iter().map(|f| f.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/a.safe"), PathBuf::from("/b.safe")]);

        assert!(store.untrack(Path::new("/a.safe")).unwrap());
        assert!(!store.untrack(Path::new("/a.safe")).unwrap());
    }
}
