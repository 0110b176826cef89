//! Store trait definitions.
//!
//! `PasswordStore` holds the single password verification hash. `FileRegistry`
//! remembers every SafeFile the user created so a password rotation can reach
//! all of them.

use std::path::Path;

use super::types::TrackedFile;
use crate::error::Result;

/// Persistent holder of the password verification hash.
///
/// Rotation calls [`get_hash`](PasswordStore::get_hash) before touching any
/// file and [`set_hash`](PasswordStore::set_hash) only as its final commit
/// step.
pub trait PasswordStore {
    /// Current verification hash.
    ///
    /// # Errors
    ///
    /// Returns `SafeError::PasswordNotSet` if no hash has been stored yet.
    fn get_hash(&self) -> Result<String>;

    /// Replace the verification hash.
    fn set_hash(&mut self, hash: &str) -> Result<()>;

    /// Whether a hash has been stored.
    fn is_initialized(&self) -> Result<bool> {
        match self.get_hash() {
            Ok(_) => Ok(true),
            Err(crate::error::SafeError::PasswordNotSet) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Registry of SafeFiles created by the user.
pub trait FileRegistry {
    /// Register a SafeFile. Returns `false` if it was already tracked.
    fn track(&mut self, path: &Path) -> Result<bool>;

    /// Forget a SafeFile. Returns `false` if it was not tracked.
    fn untrack(&mut self, path: &Path) -> Result<bool>;

    /// Every tracked file, ordered by path.
    fn tracked(&self) -> Result<Vec<TrackedFile>>;
}
