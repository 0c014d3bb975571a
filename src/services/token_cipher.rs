//! AES-256-GCM sealing for bearer tokens held in the in-process cache.
//!
//! Sealed tokens are stored as hex strings `{ciphertext, iv, auth_tag}` and
//! bound to a fixed associated-data context, so an envelope produced for some
//! other purpose will not open here. Opening fails closed: a malformed
//! envelope, a wrong-length IV or tag, or a failed tag check all return a
//! [`CipherError`] and never yield plaintext.

use crate::constants::buffers::{CRYPTO_IV_SIZE, CRYPTO_KEY_SIZE, CRYPTO_TAG_SIZE};
use crate::constants::crypto::TOKEN_AAD;
use crate::services::logger::Logger;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::Aes256Gcm;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("malformed token envelope: {0}")]
    MalformedEnvelope(&'static str),
    #[error("invalid iv length: expected {expected} bytes, got {actual}")]
    IvLength { expected: usize, actual: usize },
    #[error("invalid auth tag length: expected {expected} bytes, got {actual}")]
    TagLength { expected: usize, actual: usize },
    #[error("token failed authentication")]
    Authentication,
    #[error("token encryption failed")]
    Encryption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedToken {
    pub ciphertext: String,
    pub iv: String,
    pub auth_tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Supplied,
    Generated,
}

#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
    key_source: KeySource,
}

impl TokenCipher {
    /// Uses the supplied key when present, otherwise a random per-process key.
    pub fn new(raw_key: Option<&str>, logger: &Logger) -> Self {
        match raw_key.map(str::trim).filter(|key| !key.is_empty()) {
            Some(raw) => Self::from_key_bytes(derive_key(raw), KeySource::Supplied),
            None => {
                logger.warn(
                    "LEDGER_CACHE_ENCRYPTION_KEY is not set; using a random per-process key. Cached tokens will not survive a restart.",
                    None,
                );
                let mut key = [0u8; CRYPTO_KEY_SIZE];
                OsRng.fill_bytes(&mut key);
                Self::from_key_bytes(key, KeySource::Generated)
            }
        }
    }

    pub fn from_key_bytes(key: [u8; CRYPTO_KEY_SIZE], key_source: KeySource) -> Self {
        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&key);
        Self {
            cipher: Aes256Gcm::new(key),
            key_source,
        }
    }

    pub fn key_source(&self) -> KeySource {
        self.key_source
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedToken, CipherError> {
        let mut iv = [0u8; CRYPTO_IV_SIZE];
        OsRng.fill_bytes(&mut iv);
        let nonce = aes_gcm::Nonce::from_slice(&iv);
        let mut ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: TOKEN_AAD.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Encryption)?;
        if ciphertext.len() < CRYPTO_TAG_SIZE {
            return Err(CipherError::Encryption);
        }
        let tag = ciphertext.split_off(ciphertext.len() - CRYPTO_TAG_SIZE);
        Ok(SealedToken {
            ciphertext: hex::encode(ciphertext),
            iv: hex::encode(iv),
            auth_tag: hex::encode(tag),
        })
    }

    pub fn open(&self, sealed: &SealedToken) -> Result<String, CipherError> {
        let iv = hex::decode(&sealed.iv).map_err(|_| CipherError::MalformedEnvelope("iv"))?;
        let tag =
            hex::decode(&sealed.auth_tag).map_err(|_| CipherError::MalformedEnvelope("auth_tag"))?;
        let data = hex::decode(&sealed.ciphertext)
            .map_err(|_| CipherError::MalformedEnvelope("ciphertext"))?;

        if tag.len() != CRYPTO_TAG_SIZE {
            return Err(CipherError::TagLength {
                expected: CRYPTO_TAG_SIZE,
                actual: tag.len(),
            });
        }
        if iv.len() != CRYPTO_IV_SIZE {
            return Err(CipherError::IvLength {
                expected: CRYPTO_IV_SIZE,
                actual: iv.len(),
            });
        }

        let mut combined = Vec::with_capacity(data.len() + tag.len());
        combined.extend_from_slice(&data);
        combined.extend_from_slice(&tag);
        let nonce = aes_gcm::Nonce::from_slice(&iv);
        let decrypted = self
            .cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &combined,
                    aad: TOKEN_AAD.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(decrypted).map_err(|_| CipherError::MalformedEnvelope("plaintext"))
    }
}

/// Accepts 64 hex chars, exactly 32 raw bytes, or base64 of 32 bytes as-is.
/// Anything else is stretched to 32 bytes with SHA-256.
fn derive_key(raw: &str) -> [u8; CRYPTO_KEY_SIZE] {
    let mut key = [0u8; CRYPTO_KEY_SIZE];
    if raw.len() == CRYPTO_KEY_SIZE * 2 {
        if let Ok(decoded) = hex::decode(raw) {
            key.copy_from_slice(&decoded);
            return key;
        }
    }
    if raw.len() == CRYPTO_KEY_SIZE {
        key.copy_from_slice(raw.as_bytes());
        return key;
    }
    if raw.len() > CRYPTO_KEY_SIZE {
        let engine = base64::engine::general_purpose::STANDARD;
        if let Ok(decoded) = engine.decode(raw.as_bytes()) {
            if decoded.len() == CRYPTO_KEY_SIZE {
                key.copy_from_slice(&decoded);
                return key;
            }
        }
    }
    key.copy_from_slice(&Sha256::digest(raw.as_bytes()));
    key
}
