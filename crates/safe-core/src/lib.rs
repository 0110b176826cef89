//! # Safe Core
//!
//! Core library for safe - password-based, line-oriented file encryption with
//! all-or-nothing password rotation.
//!
//! This crate provides the conversion and key-rotation engine independent of
//! the CLI interface. It performs no interactive I/O and never logs passwords,
//! keys, or plaintext.
//!
//! ## Architecture
//!
//! - **crypto**: key derivation, line cipher, password verification hash
//! - **convert**: whole-file encryption/decryption with naming and overwrite rules
//! - **rotation**: journaled two-phase re-encryption under a new password
//! - **shell**: decrypt, run a whitelisted program, re-encrypt, erase
//! - **store**: password verification store and tracked-file registry
//! - **fs**: atomic writes, cross-volume moves, secure erase

pub mod convert;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod rotation;
pub mod shell;
pub mod store;

pub use convert::{convert, ConversionRequest, Direction};
pub use crypto::{derive_key, DerivedKey, LineCipher, Password};
pub use error::{ErrorKind, Result, SafeError};
pub use rotation::{RotationPlan, RotationReport, RotationTransaction};
pub use shell::{ShellBridge, ShellCommand, ShellOutcome};
pub use store::{FileRegistry, MemoryStore, PasswordStore, SqliteStore, TrackedFile};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
