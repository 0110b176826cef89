//! Per-line XChaCha20-Poly1305 encryption.
//!
//! Token format (URL-safe base64, padded):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = "safe-line-v1"
//! ```
//!
//! Every line is sealed on its own, so a damaged token only invalidates the
//! line it carries. Tokens never contain `\n`, which is the SafeFile
//! separator.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use crate::crypto::key::DerivedKey;
use crate::error::{Result, SafeError};

/// Size of an XChaCha20-Poly1305 nonce (192-bit).
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag.
pub const TAG_SIZE: usize = 16;

const LINE_AAD: &[u8] = b"safe-line-v1";

/// Authenticated line cipher keyed by a [`DerivedKey`].
pub struct LineCipher {
    cipher: XChaCha20Poly1305,
}

impl LineCipher {
    pub fn new(key: &DerivedKey) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }

    /// Seal one plaintext line into a token.
    pub fn encrypt(&self, line: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: line.as_bytes(),
                    aad: LINE_AAD,
                },
            )
            .map_err(|_| SafeError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "line encryption failed",
                ),
            })?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE.encode(sealed))
    }

    /// Open one token back into its plaintext line.
    ///
    /// # Errors
    ///
    /// Returns `SafeError::Authentication` when the token is not valid base64,
    /// is too short, was sealed under a different key, or was modified.
    pub fn decrypt(&self, token: &[u8]) -> Result<String> {
        let sealed = URL_SAFE
            .decode(trim_carriage_return(token))
            .map_err(|_| SafeError::Authentication)?;
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(SafeError::Authentication);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: LINE_AAD,
                },
            )
            .map_err(|_| SafeError::Authentication)?;

        String::from_utf8(plaintext).map_err(|err| {
            let mut bytes = err.into_bytes();
            bytes.zeroize();
            SafeError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "decrypted line is not valid UTF-8",
                ),
            }
        })
    }

    /// Seal every line, preserving order.
    pub fn encrypt_lines<'a, I>(&self, lines: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines.into_iter().map(|line| self.encrypt(line)).collect()
    }

    /// Open every token of a SafeFile body, preserving order.
    ///
    /// Tokens are separated by `\n`; a trailing separator is ignored and an
    /// empty body yields no lines. Stops at the first bad token.
    pub fn decrypt_lines(&self, body: &[u8]) -> Result<Vec<String>> {
        split_tokens(body).map(|token| self.decrypt(token)).collect()
    }
}

/// Split a SafeFile body into its tokens.
pub fn split_tokens(body: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    let empty = body.is_empty();
    body.split(|b| *b == b'\n').filter(move |_| !empty)
}

fn trim_carriage_return(token: &[u8]) -> &[u8] {
    token.strip_suffix(b"\r").unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_key, Password};

    fn cipher(password: &str) -> LineCipher {
        LineCipher::new(&derive_key(&Password::new(password)).unwrap())
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let c = cipher("hunter2");
        let token = c.encrypt("hello, encrypted world!").unwrap();
        assert_eq!(c.decrypt(token.as_bytes()).unwrap(), "hello, encrypted world!");
    }

    #[test]
    fn test_empty_line_roundtrip() {
        let c = cipher("hunter2");
        let token = c.encrypt("").unwrap();
        assert!(!token.is_empty());
        assert_eq!(c.decrypt(token.as_bytes()).unwrap(), "");
    }

    #[test]
    fn test_same_line_different_tokens() {
        let c = cipher("hunter2");
        let t1 = c.encrypt("same").unwrap();
        let t2 = c.encrypt("same").unwrap();
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_token_has_no_newline() {
        let c = cipher("hunter2");
        let token = c.encrypt("line with\ttabs and unicode é").unwrap();
        assert!(!token.contains('\n'));
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let token = cipher("hunter2").encrypt("secret").unwrap();
        let result = cipher("wrong").decrypt(token.as_bytes());
        assert!(matches!(result, Err(SafeError::Authentication)));
    }

    #[test]
    fn test_decrypt_tampered_token() {
        let c = cipher("hunter2");
        let token = c.encrypt("secret").unwrap();
        let mut sealed = URL_SAFE.decode(&token).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let tampered = URL_SAFE.encode(sealed);

        assert!(matches!(
            c.decrypt(tampered.as_bytes()),
            Err(SafeError::Authentication)
        ));
    }

    #[test]
    fn test_decrypt_garbage() {
        let c = cipher("hunter2");
        for garbage in [&b""[..], &b"not base64 at all!"[..], &b"AAAA"[..]] {
            assert!(matches!(c.decrypt(garbage), Err(SafeError::Authentication)));
        }
    }

    #[test]
    fn test_lines_roundtrip_with_crlf_tokens() {
        let c = cipher("hunter2");
        let tokens = c.encrypt_lines(["a", "", "b"]).unwrap();
        let body = format!("{}\r\n", tokens.join("\r\n"));
        assert_eq!(c.decrypt_lines(body.as_bytes()).unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens(b"").count(), 0);
        assert_eq!(split_tokens(b"\n").count(), 0);
        assert_eq!(split_tokens(b"x").collect::<Vec<_>>(), vec![&b"x"[..]]);
        assert_eq!(
            split_tokens(b"x\ny\n").collect::<Vec<_>>(),
            vec![&b"x"[..], &b"y"[..]]
        );
    }

    #[test]
    fn test_one_corrupt_token_fails_whole_batch() {
        let c = cipher("hunter2");
        let tokens = c.encrypt_lines(["a", "b", "c"]).unwrap();
        let body = format!("{}\n{}\n{}", tokens[0], "corrupted", tokens[2]);

        assert!(matches!(
            c.decrypt_lines(body.as_bytes()),
            Err(SafeError::Authentication)
        ));
        // The intact tokens still open on their own.
        assert_eq!(c.decrypt(tokens[2].as_bytes()).unwrap(), "c");
    }
}
