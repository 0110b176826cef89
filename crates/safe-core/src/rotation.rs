//! All-or-nothing password rotation across every tracked SafeFile.
//!
//! Rotation runs in two phases:
//!
//! 1. **Staging**: each file is re-encrypted under the new key into a staged
//!    sibling. Originals and the verification hash are untouched; the first
//!    failure removes every staged file and aborts.
//! 2. **Commit**: a [`CommitJournal`] is persisted, staged files are moved over
//!    their originals in journal order, the new verification hash is stored,
//!    and the journal is deleted. A failure here leaves the journal behind so
//!    [`RotationTransaction::resume`] can finish the job.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::convert::{is_safe_file, reencrypt_body};
use crate::crypto::{derive_key, verify_password, LineCipher, Password};
use crate::error::{Result, SafeError};
use crate::fs::{move_file, MoveOutcome};
use crate::store::PasswordStore;

/// Extension of staged files.
const STAGED_EXTENSION: &str = "staged";

/// Inputs of one rotation.
#[derive(Debug)]
pub struct RotationPlan {
    pub old_password: Password,
    pub new_password: Password,
    pub files: Vec<PathBuf>,
    /// Where staged files go; next to each original when `None`.
    pub staging_dir: Option<PathBuf>,
}

impl RotationPlan {
    pub fn new(old_password: Password, new_password: Password, files: Vec<PathBuf>) -> Self {
        Self {
            old_password,
            new_password,
            files,
            staging_dir: None,
        }
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }
}

/// Outcome of a completed rotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Every file now encrypted under the new key, in commit order
    pub rotated: Vec<PathBuf>,

    /// Files that were moved by copy across volumes instead of renamed
    pub degraded: Vec<PathBuf>,
}

/// One staged file and the original it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub staged: PathBuf,
    pub target: PathBuf,
    /// BLAKE3 of the staged bytes, hex encoded
    pub digest: String,
}

impl JournalEntry {
    pub fn new(staged: impl Into<PathBuf>, target: impl Into<PathBuf>, staged_body: &[u8]) -> Self {
        Self {
            staged: staged.into(),
            target: target.into(),
            digest: content_digest(staged_body),
        }
    }

    /// Moved already: the staged file is gone and the target holds its bytes.
    fn is_committed(&self) -> bool {
        if self.staged.exists() {
            return false;
        }
        fs::read(&self.target)
            .map(|body| content_digest(&body) == self.digest)
            .unwrap_or(false)
    }
}

/// Hex BLAKE3 digest recorded for staged content.
pub fn content_digest(body: &[u8]) -> String {
    blake3::hash(body).to_hex().to_string()
}

/// Durable record of a staged rotation, written before the first commit move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitJournal {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Verification hash of the new password
    pub new_hash: String,
    pub entries: Vec<JournalEntry>,
}

impl CommitJournal {
    pub fn new(new_hash: String, entries: Vec<JournalEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            new_hash,
            entries,
        }
    }

    /// Read a journal, `None` if there is none.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SafeError::Journal(format!("{}: {}", path.display(), err))),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Persist atomically with owner-only permissions.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        fs::create_dir_all(crate::fs::parent_dir(path))
            .and_then(|_| crate::fs::write_atomic(path, &data, true))
            .and_then(|_| crate::fs::set_private_permissions(path))
            .map_err(|err| SafeError::Journal(format!("{}: {}", path.display(), err)))
    }

    /// Number of entries already moved into place.
    pub fn committed_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_committed()).count()
    }
}

/// Rotation of every tracked file to a new password.
pub struct RotationTransaction<'a> {
    store: &'a mut dyn PasswordStore,
    journal_path: PathBuf,
}

impl<'a> RotationTransaction<'a> {
    pub fn new(store: &'a mut dyn PasswordStore, journal_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            journal_path: journal_path.into(),
        }
    }

    /// Whether an interrupted commit is waiting for [`resume`](Self::resume).
    pub fn is_pending(&self) -> bool {
        self.journal_path.exists()
    }

    /// Re-encrypt every file in `plan` under the new password.
    ///
    /// # Errors
    ///
    /// - `PartialCommit` if a previous commit is still pending, or if this
    ///   commit could not move every file or store the new hash
    /// - `Authentication` / `PasswordNotSet` if the old password is not verified
    /// - `InvalidPassword` if the new password cannot derive a key
    /// - `FileNotFound` / `NotASafeFile` for a bad entry in the plan
    /// - `ConversionFailed` if staging any file fails; nothing was changed
    pub fn rotate(&mut self, plan: &RotationPlan) -> Result<RotationReport> {
        if let Some(pending) = CommitJournal::load(&self.journal_path)? {
            return Err(SafeError::PartialCommit {
                committed: pending.committed_count(),
                total: pending.entries.len(),
            });
        }

        verify_password(&*self.store, &plan.old_password)?;
        let old_cipher = LineCipher::new(&derive_key(&plan.old_password)?);
        let new_cipher = LineCipher::new(&derive_key(&plan.new_password)?);

        let files: BTreeSet<&PathBuf> = plan.files.iter().collect();
        for file in &files {
            if !file.is_file() {
                return Err(SafeError::FileNotFound(file.to_path_buf()));
            }
            if !is_safe_file(file) {
                return Err(SafeError::NotASafeFile(file.to_path_buf()));
            }
        }

        tracing::info!(files = files.len(), "staging password rotation");
        let entries = stage_all(&files, plan.staging_dir.as_deref(), &old_cipher, &new_cipher)?;

        let journal = CommitJournal::new(plan.new_password.verification_hash(), entries);
        if let Err(err) = journal.save(&self.journal_path) {
            remove_staged(&journal.entries);
            return Err(err);
        }

        self.commit(&journal)
    }

    /// Finish a commit left behind by an interrupted or failed rotation.
    ///
    /// Returns `Ok(None)` when nothing is pending. Safe to call repeatedly.
    pub fn resume(&mut self) -> Result<Option<RotationReport>> {
        match CommitJournal::load(&self.journal_path)? {
            Some(journal) => {
                tracing::info!(id = %journal.id, "resuming password rotation");
                self.commit(&journal).map(Some)
            }
            None => Ok(None),
        }
    }

    fn commit(&mut self, journal: &CommitJournal) -> Result<RotationReport> {
        let total = journal.entries.len();
        let mut report = RotationReport::default();

        // Roll forward: one failed move must not strand the others.
        for entry in &journal.entries {
            match commit_entry(entry) {
                Ok(outcome) => {
                    if outcome == Some(MoveOutcome::Copied) {
                        tracing::warn!(
                            path = %entry.target.display(),
                            "staged file crossed volumes; replaced by copy, not atomic rename"
                        );
                        report.degraded.push(entry.target.clone());
                    }
                    report.rotated.push(entry.target.clone());
                }
                Err(err) => {
                    tracing::warn!(path = %entry.target.display(), error = %err, "commit move failed");
                }
            }
        }

        let committed = report.rotated.len();
        if committed < total {
            return Err(SafeError::PartialCommit { committed, total });
        }

        if let Err(err) = self.store.set_hash(&journal.new_hash) {
            tracing::warn!(error = %err, "storing the new verification hash failed");
            return Err(SafeError::PartialCommit { committed, total });
        }

        fs::remove_file(&self.journal_path).map_err(|err| {
            SafeError::Journal(format!("{}: {}", self.journal_path.display(), err))
        })?;

        tracing::info!(files = total, "password rotation committed");
        Ok(report)
    }
}

/// Staged location for `target`.
///
/// `.<name>.staged` beside the original, or `<dir>/<seq>-<name>.staged`.
pub fn staged_path(target: &Path, staging_dir: Option<&Path>, seq: usize) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match staging_dir {
        Some(dir) => dir.join(format!("{:04}-{}.{}", seq, name, STAGED_EXTENSION)),
        None => crate::fs::parent_dir(target).join(format!(".{}.{}", name, STAGED_EXTENSION)),
    }
}

fn stage_all(
    files: &BTreeSet<&PathBuf>,
    staging_dir: Option<&Path>,
    old_cipher: &LineCipher,
    new_cipher: &LineCipher,
) -> Result<Vec<JournalEntry>> {
    if let Some(dir) = staging_dir {
        fs::create_dir_all(dir)?;
    }

    let mut entries = Vec::with_capacity(files.len());
    for (seq, target) in files.iter().enumerate() {
        let staged = staged_path(target, staging_dir, seq);
        let result = fs::read(target)
            .map_err(SafeError::from)
            .and_then(|body| reencrypt_body(old_cipher, new_cipher, &body))
            .and_then(|body| {
                crate::fs::write_atomic(&staged, &body, true)?;
                Ok(JournalEntry::new(staged, target.as_path(), &body))
            });

        match result {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                tracing::warn!(path = %target.display(), error = %err, "staging failed; rolling back");
                remove_staged(&entries);
                return Err(SafeError::conversion_failed(target.as_path(), err));
            }
        }
    }
    Ok(entries)
}

fn commit_entry(entry: &JournalEntry) -> Result<Option<MoveOutcome>> {
    if entry.is_committed() {
        return Ok(None);
    }
    Ok(Some(move_file(&entry.staged, &entry.target)?))
}

fn remove_staged(entries: &[JournalEntry]) {
    for entry in entries {
        if let Err(err) = fs::remove_file(&entry.staged) {
            tracing::warn!(path = %entry.staged.display(), error = %err, "could not remove staged file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_path_beside_original() {
        let path = staged_path(Path::new("/data/notes.txt.safe"), None, 3);
        assert_eq!(path, PathBuf::from("/data/.notes.txt.safe.staged"));
    }

    #[test]
    fn test_staged_path_in_staging_dir() {
        let path = staged_path(Path::new("/data/notes.txt.safe"), Some(Path::new("/stage")), 7);
        assert_eq!(path, PathBuf::from("/stage/0007-notes.txt.safe.staged"));
    }

    #[test]
    fn test_journal_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CommitJournal::load(&dir.path().join("rotation.journal"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_journal_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("rotation.journal");
        let journal = CommitJournal::new(
            "abc".to_string(),
            vec![JournalEntry::new(
                dir.path().join(".a.safe.staged"),
                dir.path().join("a.safe"),
                b"token",
            )],
        );

        journal.save(&path).unwrap();
        let loaded = CommitJournal::load(&path).unwrap().unwrap();

        assert_eq!(loaded.id, journal.id);
        assert_eq!(loaded.new_hash, "abc");
        assert_eq!(loaded.entries, journal.entries);
        assert_eq!(loaded.committed_count(), 0);
    }

    #[test]
    fn test_entry_committed_only_when_target_matches() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.safe");
        let entry = JournalEntry::new(dir.path().join(".a.safe.staged"), &target, b"new body");

        fs::write(&target, b"old body").unwrap();
        assert!(!entry.is_committed());

        fs::write(&target, b"new body").unwrap();
        assert!(entry.is_committed());

        fs::write(&entry.staged, b"new body").unwrap();
        assert!(!entry.is_committed());
    }

    #[test]
    fn test_corrupt_journal_is_journal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotation.journal");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            CommitJournal::load(&path),
            Err(SafeError::Journal(_))
        ));
    }
}
