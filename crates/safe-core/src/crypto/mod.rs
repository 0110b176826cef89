//! Cryptographic primitives for safe.
//!
//! - [`key`]: password to 32-byte key, deterministic and salt-free
//! - [`cipher`]: XChaCha20-Poly1305 sealing of individual lines
//! - [`password`]: the password newtype and its verification hash

pub mod cipher;
pub mod key;
pub mod password;

pub use cipher::LineCipher;
pub use key::{derive_key, DerivedKey, KEY_LENGTH};
pub use password::{verify_password, Password};
