//! Error types for safe core operations.
//!
//! Every failure the engine can report is a distinct variant so the CLI layer
//! can map each one to its own exit code and message. Errors never carry
//! passwords, key material, or decrypted content.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for safe operations.
pub type Result<T> = std::result::Result<T, SafeError>;

/// Core error type for safe operations.
#[derive(Debug, Error)]
pub enum SafeError {
    /// Password is empty or contains characters the key encoding cannot hold
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    /// Wrong password, or a token that was tampered with or corrupted
    #[error("Wrong password or corrupted file")]
    Authentication,

    /// Source file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Decryption requested on a file without the `.safe` suffix
    #[error("Not a .safe file: {}", .0.display())]
    NotASafeFile(PathBuf),

    /// Explicit target name violates the naming convention
    #[error("Invalid target name: {0}")]
    InvalidTargetName(String),

    /// Target exists and overwriting was not requested
    #[error("Refusing to overwrite existing file: {}", .0.display())]
    WouldOverwrite(PathBuf),

    /// A whole-file conversion was aborted
    #[error("Conversion of {} failed: {source}", path.display())]
    ConversionFailed {
        path: PathBuf,
        #[source]
        source: Box<SafeError>,
    },

    /// Shell command outside the supported set
    #[error("Command `{0}` is not supported")]
    UnsupportedCommand(String),

    /// Rotation staged successfully but not every file was committed yet
    #[error("Password rotation partially committed ({committed}/{total} files); re-run to finish")]
    PartialCommit { committed: usize, total: usize },

    /// No password verification hash has been stored yet
    #[error("No password has been set yet")]
    PasswordNotSet,

    /// Password verification store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Rotation journal could not be read or written
    #[error("Rotation journal error: {0}")]
    Journal(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Fieldless mirror of [`SafeError`] used for exhaustive mapping (exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPassword,
    Authentication,
    FileNotFound,
    NotASafeFile,
    InvalidTargetName,
    WouldOverwrite,
    ConversionFailed,
    UnsupportedCommand,
    PartialCommit,
    PasswordNotSet,
    Store,
    Journal,
    Io,
}

impl SafeError {
    /// Wrap an error as the cause of a failed conversion of `path`.
    pub fn conversion_failed(path: impl Into<PathBuf>, source: SafeError) -> Self {
        SafeError::ConversionFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SafeError::InvalidPassword(_) => ErrorKind::InvalidPassword,
            SafeError::Authentication => ErrorKind::Authentication,
            SafeError::FileNotFound(_) => ErrorKind::FileNotFound,
            SafeError::NotASafeFile(_) => ErrorKind::NotASafeFile,
            SafeError::InvalidTargetName(_) => ErrorKind::InvalidTargetName,
            SafeError::WouldOverwrite(_) => ErrorKind::WouldOverwrite,
            SafeError::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            SafeError::UnsupportedCommand(_) => ErrorKind::UnsupportedCommand,
            SafeError::PartialCommit { .. } => ErrorKind::PartialCommit,
            SafeError::PasswordNotSet => ErrorKind::PasswordNotSet,
            SafeError::Store(_) => ErrorKind::Store,
            SafeError::Journal(_) => ErrorKind::Journal,
            SafeError::Io { .. } => ErrorKind::Io,
        }
    }

    /// The innermost cause of a (possibly nested) conversion failure.
    pub fn root_cause(&self) -> &SafeError {
        match self {
            SafeError::ConversionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<rusqlite::Error> for SafeError {
    fn from(err: rusqlite::Error) -> Self {
        SafeError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for SafeError {
    fn from(err: serde_json::Error) -> Self {
        SafeError::Journal(err.to_string())
    }
}
