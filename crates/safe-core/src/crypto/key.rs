//! Deterministic key derivation from a password.
//!
//! The key is the password repeated (or truncated) to 43 URL-safe base64
//! characters plus one `=` of padding, decoded into 32 bytes. There is no salt
//! and no stretching: decrypting must work with nothing but the password, and
//! files encrypted by earlier versions of the tool must keep decrypting. The
//! strength of a key is therefore exactly the strength of its password.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::password::Password;
use crate::error::{Result, SafeError};

/// Length of the derived key in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Length of the base64 text the password is stretched to, padding included.
const ENCODED_KEY_LENGTH: usize = 44;

/// URL-safe base64 that tolerates non-zero trailing bits, as the original
/// derivation never cleared them.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// A cryptographic key derived from a password.
///
/// This type ensures that key material is securely zeroized from memory
/// when dropped, reducing the window of exposure.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    /// The raw key bytes (zeroized on drop)
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the encryption key for a password.
///
/// # Errors
///
/// Returns `SafeError::InvalidPassword` if the password is empty or contains
/// a character outside the URL-safe base64 alphabet (`A-Z a-z 0-9 - _`).
///
/// # Examples
///
/// ```
/// use safe_core::crypto::{derive_key, Password};
///
/// let first = derive_key(&Password::new("hunter2")).unwrap();
/// let second = derive_key(&Password::new("hunter2")).unwrap();
/// assert_eq!(first.as_bytes(), second.as_bytes());
/// ```
pub fn derive_key(password: &Password) -> Result<DerivedKey> {
    let secret = password.expose();
    if secret.is_empty() {
        return Err(SafeError::InvalidPassword(
            "Password cannot be empty".to_string(),
        ));
    }
    if let Some(position) = secret.chars().position(|c| !is_key_char(c)) {
        return Err(SafeError::InvalidPassword(format!(
            "Unsupported character at position {}; use letters, digits, '-' or '_'",
            position + 1
        )));
    }

    let mut encoded = stretch(secret);
    let decoded = KEY_ENGINE.decode(encoded.as_bytes());
    encoded.zeroize();
    let mut decoded = decoded.map_err(|e| {
        SafeError::InvalidPassword(format!("Password cannot be encoded as a key: {}", e))
    })?;

    // 43 alphabet characters plus one pad always decode to 32 bytes.
    assert_eq!(decoded.len(), KEY_LENGTH, "derived key has wrong length");
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&decoded);
    decoded.zeroize();

    Ok(DerivedKey::from_bytes(key))
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Repeat `root` to at least 44 characters, keep 43 and append `=`.
fn stretch(root: &str) -> String {
    let mut extended = String::with_capacity(ENCODED_KEY_LENGTH * 2);
    while extended.len() < ENCODED_KEY_LENGTH {
        extended.push_str(root);
    }
    extended.truncate(ENCODED_KEY_LENGTH - 1);
    extended.push('=');
    extended
}
