//! Run a whitelisted program against the decrypted content of a SafeFile.
//!
//! The SafeFile is decrypted into a private directory under a non-persistent
//! root, the program runs on that copy, and the copy is re-encrypted (if it
//! changed) and erased before control returns. Cleanup also runs when the
//! program fails to start, exits non-zero, or the user hits Ctrl-C.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::str::FromStr;

use tempfile::TempDir;
use zeroize::Zeroize;

use crate::convert::{convert, is_safe_file, ConversionRequest, SAFE_SUFFIX};
use crate::crypto::Password;
use crate::error::{Result, SafeError};

/// Programs that may be run on decrypted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Cat,
    Grep,
    Less,
    Nano,
    Vi,
    Vim,
}

impl ShellCommand {
    pub const ALL: [ShellCommand; 6] = [
        ShellCommand::Cat,
        ShellCommand::Grep,
        ShellCommand::Less,
        ShellCommand::Nano,
        ShellCommand::Vi,
        ShellCommand::Vim,
    ];

    /// Executable name looked up on `PATH`.
    pub fn program(self) -> &'static str {
        match self {
            ShellCommand::Cat => "cat",
            ShellCommand::Grep => "grep",
            ShellCommand::Less => "less",
            ShellCommand::Nano => "nano",
            ShellCommand::Vi => "vi",
            ShellCommand::Vim => "vim",
        }
    }
}

impl FromStr for ShellCommand {
    type Err = SafeError;

    fn from_str(s: &str) -> Result<Self> {
        ShellCommand::ALL
            .into_iter()
            .find(|command| command.program() == s)
            .ok_or_else(|| SafeError::UnsupportedCommand(s.to_string()))
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Result of a [`ShellBridge::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOutcome {
    /// Exit status of the program
    pub status: ExitStatus,

    /// Whether the SafeFile was rewritten with edited content
    pub reencrypted: bool,

    /// Termination signal caught while the plaintext existed, if any
    pub signal: Option<i32>,
}

/// Decrypt, run, re-encrypt, erase.
#[derive(Debug, Clone)]
pub struct ShellBridge {
    transient_root: PathBuf,
}

impl Default for ShellBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellBridge {
    /// Bridge using `/dev/shm` when available, the system temp dir otherwise.
    pub fn new() -> Self {
        Self::with_transient_root(default_transient_root())
    }

    pub fn with_transient_root(root: impl Into<PathBuf>) -> Self {
        Self {
            transient_root: root.into(),
        }
    }

    pub fn transient_root(&self) -> &Path {
        &self.transient_root
    }

    /// Run `command args... <plaintext copy>` on the content of `safe_path`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedCommand` before anything is decrypted
    /// - any [`convert`] error while decrypting
    /// - `Io` if the program cannot be started
    /// - re-encryption or erase failures; the plaintext is erased regardless
    pub fn run(
        &self,
        password: &Password,
        safe_path: &Path,
        command: &str,
        args: &[String],
    ) -> Result<ShellOutcome> {
        let command: ShellCommand = command.parse()?;

        // Held from decryption until the copy is erased; `copy` drops first.
        let _signals = SignalGuard::install();
        let copy = self.open_transient(password, safe_path)?;

        tracing::debug!(%command, path = %copy.safe_path().display(), "running command on transient copy");
        let status = Command::new(command.program())
            .args(args)
            .arg(copy.path())
            .status();

        let reencrypted = copy.finish()?;
        let signal = SignalGuard::last_signal();
        if let Some(signal) = signal {
            tracing::info!(signal, "signal received while plaintext existed; cleaned up");
        }
        let status = status.map_err(|err| {
            SafeError::from(io::Error::new(
                err.kind(),
                format!("Failed to start {}: {}", command, err),
            ))
        })?;

        Ok(ShellOutcome {
            status,
            reencrypted,
            signal,
        })
    }

    /// Decrypt `safe_path` into a fresh private directory.
    ///
    /// The returned guard re-encrypts edits and erases the copy when it is
    /// finished or dropped.
    pub fn open_transient<'p>(
        &self,
        password: &'p Password,
        safe_path: &Path,
    ) -> Result<TransientPlainCopy<'p>> {
        let safe_path = fs::canonicalize(safe_path)
            .map_err(|_| SafeError::FileNotFound(safe_path.to_path_buf()))?;
        let plain_name = safe_path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|_| is_safe_file(&safe_path))
            .and_then(|name| name.strip_suffix(SAFE_SUFFIX))
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SafeError::NotASafeFile(safe_path.clone()))?;

        let dir = tempfile::Builder::new()
            .prefix("safe-")
            .tempdir_in(&self.transient_root)?;
        let mut copy = TransientPlainCopy {
            path: dir.path().join(plain_name),
            dir: Some(dir),
            safe_path,
            password,
            original: None,
        };

        convert(
            &ConversionRequest::decrypt(&copy.safe_path).with_target(&copy.path),
            password,
        )?;
        crate::fs::set_private_permissions(&copy.path)?;
        copy.original = Some(digest_file(&copy.path)?);
        Ok(copy)
    }
}

/// Decrypted copy of a SafeFile that must not outlive one bridge invocation.
pub struct TransientPlainCopy<'p> {
    dir: Option<TempDir>,
    path: PathBuf,
    safe_path: PathBuf,
    password: &'p Password,
    original: Option<blake3::Hash>,
}

impl TransientPlainCopy<'_> {
    /// Location of the plaintext.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical path of the SafeFile this copy came from.
    pub fn safe_path(&self) -> &Path {
        &self.safe_path
    }

    /// Re-encrypt if edited, then erase. Returns whether the SafeFile changed.
    pub fn finish(mut self) -> Result<bool> {
        self.release()
    }

    fn release(&mut self) -> Result<bool> {
        let Some(dir) = self.dir.take() else {
            return Ok(false);
        };

        let reencrypted = self.reencrypt_if_changed();
        let erased = erase_dir(dir.path());
        let removed = dir.close();

        let reencrypted = reencrypted?;
        erased?;
        removed?;
        Ok(reencrypted)
    }

    fn reencrypt_if_changed(&self) -> Result<bool> {
        let Some(original) = self.original else {
            return Ok(false);
        };
        let current = match digest_file(&self.path) {
            Ok(current) => current,
            Err(SafeError::Io { source }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.safe_path.display(),
                    "transient copy was removed; leaving the SafeFile unchanged"
                );
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        if current == original {
            return Ok(false);
        }

        convert(
            &ConversionRequest::encrypt(&self.path)
                .with_target(&self.safe_path)
                .with_overwrite(true),
            self.password,
        )?;
        tracing::debug!(path = %self.safe_path.display(), "re-encrypted edited content");
        Ok(true)
    }
}

impl Drop for TransientPlainCopy<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "transient copy cleanup failed");
        }
    }
}

/// Default root for transient plaintext.
pub fn default_transient_root() -> PathBuf {
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        shm.to_path_buf()
    } else {
        std::env::temp_dir()
    }
}

fn digest_file(path: &Path) -> Result<blake3::Hash> {
    let mut data = fs::read(path)?;
    let digest = blake3::hash(&data);
    data.zeroize();
    Ok(digest)
}

/// Erase every file an editor may have left in the private directory
/// (the copy itself, swap and backup files).
fn erase_dir(dir: &Path) -> io::Result<()> {
    let mut result = Ok(());
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let erased = if path.is_dir() {
            erase_dir(&path)
        } else {
            crate::fs::secure_erase(&path)
        };
        if result.is_ok() {
            result = erased;
        }
    }
    result
}

#[cfg(unix)]
use signals::SignalGuard;

#[cfg(unix)]
mod signals {
    use std::sync::atomic::{AtomicI32, Ordering};

    static LAST_SIGNAL: AtomicI32 = AtomicI32::new(0);

    const CAUGHT: [libc::c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

    extern "C" fn record(signal: libc::c_int) {
        LAST_SIGNAL.store(signal, Ordering::SeqCst);
    }

    /// Catches termination signals for its lifetime so this process survives
    /// long enough to clean up. Handlers reset to default across `exec`, so
    /// the child still reacts to Ctrl-C normally.
    pub(super) struct SignalGuard {
        previous: Vec<(libc::c_int, libc::sighandler_t)>,
    }

    impl SignalGuard {
        pub(super) fn install() -> Self {
            LAST_SIGNAL.store(0, Ordering::SeqCst);
            let handler = record as extern "C" fn(libc::c_int) as libc::sighandler_t;
            let mut previous = Vec::with_capacity(CAUGHT.len());
            for signal in CAUGHT {
                // SAFETY: `record` only touches an atomic, which is async-signal-safe.
                let old = unsafe { libc::signal(signal, handler) };
                if old != libc::SIG_ERR {
                    previous.push((signal, old));
                }
            }
            Self { previous }
        }

        pub(super) fn last_signal() -> Option<i32> {
            match LAST_SIGNAL.load(Ordering::SeqCst) {
                0 => None,
                signal => Some(signal),
            }
        }
    }

    impl Drop for SignalGuard {
        fn drop(&mut self) {
            for (signal, old) in self.previous.drain(..) {
                // SAFETY: restores the disposition returned by `libc::signal`.
                unsafe {
                    libc::signal(signal, old);
                }
            }
        }
    }
}

#[cfg(not(unix))]
struct SignalGuard;

#[cfg(not(unix))]
impl SignalGuard {
    fn install() -> Self {
        SignalGuard
    }

    fn last_signal() -> Option<i32> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whitelist() {
        for command in ShellCommand::ALL {
            assert_eq!(command.program().parse::<ShellCommand>().unwrap(), command);
        }
    }

    #[test]
    fn test_parse_rejects_other_programs() {
        for bad in ["rm", "sh", "bash", "CAT", "/bin/cat", ""] {
            assert!(matches!(
                bad.parse::<ShellCommand>(),
                Err(SafeError::UnsupportedCommand(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_command_checked_before_file() {
        let bridge = ShellBridge::with_transient_root(std::env::temp_dir());
        let result = bridge.run(
            &Password::new("hunter2"),
            Path::new("/definitely/missing.safe"),
            "rm",
            &[],
        );
        assert!(matches!(result, Err(SafeError::UnsupportedCommand(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_guard_records_instead_of_terminating() {
        {
            let _signals = SignalGuard::install();
            // SAFETY: a handler for SIGHUP is installed by the guard.
            unsafe {
                libc::raise(libc::SIGHUP);
            }
            assert_eq!(SignalGuard::last_signal(), Some(libc::SIGHUP));
        }
        let _signals = SignalGuard::install();
        assert_eq!(SignalGuard::last_signal(), None);
    }

    #[test]
    fn test_default_root_exists() {
        assert!(default_transient_root().is_dir());
    }
}
