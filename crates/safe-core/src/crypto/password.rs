//! Password handling and the password verification hash.
//!
//! The verification hash (hex SHA-512 of the password) only confirms that a
//! user typed the right password. It is never used as key material.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};

use crate::error::{Result, SafeError};
use crate::store::PasswordStore;

/// A user password, held only for the duration of one operation.
///
/// The inner string is zeroized on drop and redacted from `Debug` output.
pub struct Password(SecretString);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Borrow the password text.
    ///
    /// # Security
    ///
    /// Never log or persist the returned value.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Lowercase hex SHA-512 of the password, as stored for verification.
    pub fn verification_hash(&self) -> String {
        let digest = Sha512::digest(self.expose().as_bytes());
        hex::encode(digest)
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Password::new(value)
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Check a password against the store's verification hash.
///
/// # Errors
///
/// - `SafeError::PasswordNotSet` if the store holds no hash yet
/// - `SafeError::Authentication` if the password does not match
pub fn verify_password<S: PasswordStore + ?Sized>(store: &S, password: &Password) -> Result<()> {
    let expected = store.get_hash()?;
    if expected.trim().eq_ignore_ascii_case(&password.verification_hash()) {
        Ok(())
    } else {
        Err(SafeError::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_verification_hash_is_sha512_hex() {
        let hash = Password::new("hunter2").verification_hash();
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, Password::new("hunter2").verification_hash());
        assert_ne!(hash, Password::new("hunter3").verification_hash());
    }

    #[test]
    fn test_verify_password_matches() {
        let mut store = MemoryStore::new();
        store.set_hash(&Password::new("hunter2").verification_hash()).unwrap();

        assert!(verify_password(&store, &Password::new("hunter2")).is_ok());
        assert!(matches!(
            verify_password(&store, &Password::new("wrong")),
            Err(SafeError::Authentication)
        ));
    }

    #[test]
    fn test_verify_accepts_uppercase_stored_hash() {
        let mut store = MemoryStore::new();
        let hash = Password::new("hunter2").verification_hash().to_uppercase();
        store.set_hash(&hash).unwrap();

        assert!(verify_password(&store, &Password::new("hunter2")).is_ok());
    }

    #[test]
    fn test_verify_without_hash_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            verify_password(&store, &Password::new("hunter2")),
            Err(SafeError::PasswordNotSet)
        ));
    }

    #[test]
    fn test_password_debug_redacts() {
        let debug_output = format!("{:?}", Password::new("hunter2"));
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("hunter2"));
    }
}
