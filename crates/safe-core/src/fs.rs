//! Filesystem utilities for atomic operations.
//!
//! Every write the engine performs goes through a temp file in the target's
//! directory followed by a rename, so a destination is either fully written or
//! untouched.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// Only that failure removes the destination and retries; any other error leaves the
/// destination untouched.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    let initial_err = match fs::rename(temp_path, destination) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    if !target_blocks_rename(&initial_err) || !temp_path.exists() {
        let _ = fs::remove_file(temp_path);
        return Err(initial_err);
    }

    let _ = fs::remove_file(destination);
    fs::rename(temp_path, destination).map_err(|retry_err| {
        let _ = fs::remove_file(temp_path);
        io::Error::new(
            retry_err.kind(),
            format!(
                "Atomic rename failed (initial: {}, retry: {})",
                initial_err, retry_err
            ),
        )
    })
}

/// Whether `err` is the "destination exists" failure of non-replacing renames.
fn target_blocks_rename(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::AlreadyExists
        || (cfg!(windows) && err.kind() == io::ErrorKind::PermissionDenied)
}

/// Write `data` to `path` through a synced temp file in the same directory.
///
/// With `overwrite`, an existing destination is replaced wholesale. Without
/// it, the write fails with `ErrorKind::AlreadyExists` and the destination is
/// left untouched. No temp file survives a failed call.
pub fn write_atomic(path: &Path, data: &[u8], overwrite: bool) -> io::Result<()> {
    let temp_path = temp_sibling(path, "tmp")?;
    if let Err(err) = write_synced(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    if overwrite {
        rename_with_fallback(&temp_path, path)
    } else {
        publish_no_clobber(&temp_path, path)
    }
}

/// Move `source` over `destination`.
///
/// Uses an atomic rename when both live on the same volume. Across volumes it
/// falls back to copy, verify, then delete, which is not atomic; callers get
/// [`MoveOutcome::Copied`] so they can report the degraded durability.
///
/// `source` is never removed unless `destination` holds its exact bytes.
pub fn move_file(source: &Path, destination: &Path) -> io::Result<MoveOutcome> {
    if !crosses_volumes(source, destination) {
        fs::rename(source, destination)?;
        return Ok(MoveOutcome::Renamed);
    }

    let data = fs::read(source)?;
    write_atomic(destination, &data, true)?;
    if fs::read(destination)? != data {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Copy verification failed for {}", destination.display()),
        ));
    }
    fs::remove_file(source)?;
    Ok(MoveOutcome::Copied)
}

/// How [`move_file`] relocated a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Renamed,
    Copied,
}

/// Overwrite a file's bytes with zeros, sync, then unlink it.
///
/// Missing files are not an error. On copy-on-write or journaling
/// filesystems the overwrite is best effort; the unlink always happens.
pub fn secure_erase(path: &Path) -> io::Result<()> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    let overwrite = OpenOptions::new().write(true).open(path).and_then(|mut file| {
        let zeros = [0u8; 8192];
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(zeros.len() as u64) as usize;
            file.write_all(&zeros[..chunk])?;
            remaining -= chunk as u64;
        }
        file.sync_all()
    });

    let removed = fs::remove_file(path);
    overwrite.and(removed)
}

/// Restrict a file to its owner (0600 on unix).
pub fn set_private_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// A hidden, timestamped sibling of `path`: `.<name>.<nanos>.<ext>`.
pub(crate) fn temp_sibling(path: &Path, ext: &str) -> io::Result<PathBuf> {
    let parent = parent_dir(path);
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid filename"))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("System time error: {}", e)))?
        .as_nanos();
    Ok(parent.join(format!(".{}.{}.{}", filename, nanos, ext)))
}

/// Directory containing `path`; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn publish_no_clobber(temp_path: &Path, destination: &Path) -> io::Result<()> {
    match fs::hard_link(temp_path, destination) {
        Ok(()) => {
            let _ = fs::remove_file(temp_path);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            let _ = fs::remove_file(temp_path);
            Err(err)
        }
        Err(_) => {
            // Filesystems without hard links: check, then rename.
            if destination.exists() {
                let _ = fs::remove_file(temp_path);
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists", destination.display()),
                ));
            }
            fs::rename(temp_path, destination).map_err(|err| {
                let _ = fs::remove_file(temp_path);
                err
            })
        }
    }
}

#[cfg(unix)]
fn crosses_volumes(source: &Path, destination: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let source_dev = fs::metadata(source).map(|m| m.dev());
    let dest_dev = fs::metadata(parent_dir(destination)).map(|m| m.dev());
    match (source_dev, dest_dev) {
        (Ok(a), Ok(b)) => a != b,
        _ => false,
    }
}

#[cfg(not(unix))]
fn crosses_volumes(_source: &Path, _destination: &Path) -> bool {
    false
}
