//! Whole-file conversion between PlainFiles and SafeFiles.
//!
//! A conversion either publishes exactly one complete output file or leaves
//! the filesystem untouched. The checks run in a fixed order: source exists,
//! suffix (decrypt only), target name, overwrite guard, then the transform.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use zeroize::Zeroize;

use crate::crypto::{derive_key, LineCipher, Password};
use crate::error::{Result, SafeError};

/// File name suffix that marks a SafeFile.
pub const SAFE_SUFFIX: &str = ".safe";

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Decrypt for paths ending in `.safe`, encrypt for everything else.
    pub fn infer(path: &Path) -> Self {
        if is_safe_file(path) {
            Direction::Decrypt
        } else {
            Direction::Encrypt
        }
    }
}

/// One file conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub direction: Direction,
    pub overwrite: bool,
    pub target: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>, direction: Direction) -> Self {
        Self {
            source: source.into(),
            direction,
            overwrite: false,
            target: None,
        }
    }

    pub fn encrypt(source: impl Into<PathBuf>) -> Self {
        Self::new(source, Direction::Encrypt)
    }

    pub fn decrypt(source: impl Into<PathBuf>) -> Self {
        Self::new(source, Direction::Decrypt)
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Whether the file name of `path` ends in `.safe`.
pub fn is_safe_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(SAFE_SUFFIX))
        .unwrap_or(false)
}

/// Convert one file and return the path written.
///
/// # Errors
///
/// - `FileNotFound` if the source is missing or not a regular file
/// - `NotASafeFile` when decrypting a file without the `.safe` suffix
/// - `InvalidTargetName` for an explicit decrypt target ending in `.safe`
/// - `WouldOverwrite` if the target exists and `overwrite` is not set
/// - `ConversionFailed` if reading or transforming the content fails
/// - `InvalidPassword` if the password cannot derive a key
///
/// # Examples
///
/// ```no_run
/// use safe_core::convert::{convert, ConversionRequest};
/// use safe_core::crypto::Password;
///
/// let password = Password::new("hunter2");
/// let written = convert(&ConversionRequest::encrypt("notes.txt"), &password)?;
/// assert_eq!(written.to_str(), Some("notes.txt.safe"));
/// # Ok::<(), safe_core::SafeError>(())
/// ```
pub fn convert(request: &ConversionRequest, password: &Password) -> Result<PathBuf> {
    let source = request.source.as_path();
    match fs::metadata(source) {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(SafeError::FileNotFound(source.to_path_buf())),
    }
    if request.direction == Direction::Decrypt && !is_safe_file(source) {
        return Err(SafeError::NotASafeFile(source.to_path_buf()));
    }

    let target = resolve_target(request)?;
    if !request.overwrite && target.exists() {
        return Err(SafeError::WouldOverwrite(target));
    }

    let cipher = LineCipher::new(&derive_key(password)?);
    let mut output = match request.direction {
        Direction::Encrypt => encrypt_file(&cipher, source),
        Direction::Decrypt => decrypt_file(&cipher, source),
    }
    .map_err(|err| SafeError::conversion_failed(source, err))?;

    let written = publish(&target, &output, request.overwrite);
    output.zeroize();
    written?;

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        direction = ?request.direction,
        "converted file"
    );
    Ok(target)
}

/// Output path for a request, after applying the naming rules.
pub fn resolve_target(request: &ConversionRequest) -> Result<PathBuf> {
    let source = request.source.as_path();
    let target = match (&request.target, request.direction) {
        (None, Direction::Encrypt) => append_suffix(source),
        (None, Direction::Decrypt) => strip_suffix(source)?,
        (Some(explicit), direction) => {
            let name = explicit
                .file_name()
                .and_then(|name| name.to_str())
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    SafeError::InvalidTargetName(explicit.display().to_string())
                })?;
            let explicit = match direction {
                Direction::Encrypt if !name.ends_with(SAFE_SUFFIX) => append_suffix(explicit),
                Direction::Encrypt => explicit.clone(),
                Direction::Decrypt if name.ends_with(SAFE_SUFFIX) => {
                    return Err(SafeError::InvalidTargetName(format!(
                        "{} (decrypted files cannot end in {})",
                        name, SAFE_SUFFIX
                    )))
                }
                Direction::Decrypt => explicit.clone(),
            };
            if is_bare_name(&explicit) {
                crate::fs::parent_dir(source).join(explicit)
            } else {
                explicit
            }
        }
    };
    Ok(target)
}

/// Encrypt UTF-8 text into a SafeFile body: one token per line, joined by `\n`.
pub fn encrypt_text(cipher: &LineCipher, text: &str) -> Result<Vec<u8>> {
    let tokens = cipher.encrypt_lines(text.lines())?;
    Ok(tokens.join("\n").into_bytes())
}

/// Decrypt a SafeFile body into text with every line terminated by `\n`.
pub fn decrypt_body(cipher: &LineCipher, body: &[u8]) -> Result<Vec<u8>> {
    let mut lines = cipher.decrypt_lines(body)?;
    let mut text = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in &lines {
        text.extend_from_slice(line.as_bytes());
        text.push(b'\n');
    }
    lines.iter_mut().for_each(|line| line.zeroize());
    Ok(text)
}

/// Re-encrypt a SafeFile body from one key to another without writing plaintext.
pub fn reencrypt_body(from: &LineCipher, to: &LineCipher, body: &[u8]) -> Result<Vec<u8>> {
    let mut lines = from.decrypt_lines(body)?;
    let tokens = to.encrypt_lines(lines.iter().map(String::as_str));
    lines.iter_mut().for_each(|line| line.zeroize());
    Ok(tokens?.join("\n").into_bytes())
}

fn encrypt_file(cipher: &LineCipher, source: &Path) -> Result<Vec<u8>> {
    let mut text = fs::read_to_string(source)?;
    let body = encrypt_text(cipher, &text);
    text.zeroize();
    body
}

fn decrypt_file(cipher: &LineCipher, source: &Path) -> Result<Vec<u8>> {
    let body = fs::read(source)?;
    decrypt_body(cipher, &body)
}

fn publish(target: &Path, data: &[u8], overwrite: bool) -> Result<()> {
    crate::fs::write_atomic(target, data, overwrite).map_err(|err| {
        if err.kind() == io::ErrorKind::AlreadyExists {
            SafeError::WouldOverwrite(target.to_path_buf())
        } else {
            SafeError::from(err)
        }
    })
}

fn append_suffix(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(SAFE_SUFFIX);
    PathBuf::from(name)
}

fn strip_suffix(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(SAFE_SUFFIX))
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| SafeError::InvalidTargetName(path.display().to_string()))?;
    Ok(path.with_file_name(name))
}

fn is_bare_name(path: &Path) -> bool {
    path.parent().map_or(true, |parent| parent.as_os_str().is_empty())
}
