//! # Cipher Seam
//!
//! Byte-level confidentiality transform applied after encoding, inverted
//! before decoding. The pipelines see only the [`Cipher`] trait; deployments
//! supply the transform (or [`PlainCipher`] for cleartext links).
//!
//! [`XChaChaCipher`] provides XChaCha20-Poly1305 AEAD with a random 24-byte
//! nonce prepended to each ciphertext, so `decrypt(encrypt(b)) == b` holds
//! without any shared per-message state.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;

use crate::error::{Result, SessionError};

/// Nonce length for XChaCha20-Poly1305.
const NONCE_LEN: usize = 24;

/// Reversible byte-level confidentiality transform.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Identity transform for unencrypted deployments and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCipher;

impl Cipher for PlainCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

/// XChaCha20-Poly1305 AEAD cipher with a per-message random nonce.
///
/// Ciphertext layout: `nonce(24) || aead_ciphertext`.
pub struct XChaChaCipher {
    cipher: XChaCha20Poly1305,
}

impl XChaChaCipher {
    /// Build from a 32-byte symmetric key negotiated out of band.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }
}

impl Cipher for XChaChaCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| SessionError::EncryptionFailure)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(SessionError::DecryptionFailure);
        }
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
        self.cipher
            .decrypt(XNonce::from_slice(nonce_bytes), body)
            .map_err(|_| SessionError::DecryptionFailure)
    }
}
