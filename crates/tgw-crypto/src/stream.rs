//! Full-object stream codec: single-pass AES-CTR over chunked byte streams.
//!
//! The encryptor draws one random IV per object; the IV travels as the
//! first 16 bytes of stored output and the counter starts at the IV itself.
//! Both directions work chunk-at-a-time with bounded memory, for inputs from
//! a few bytes to hundreds of megabytes.

use rand::RngCore;

use crate::cipher::{Keystream, ObjectKey};
use crate::error::CryptoError;
use crate::IV_SIZE;

/// Encrypts one object as a forward-only stream of chunks.
///
/// The caller emits `iv()` as the first 16 output bytes, then feeds every
/// plaintext chunk through `apply` and emits the result.
pub struct StreamEncryptor {
    iv: [u8; IV_SIZE],
    keystream: Keystream,
}

impl StreamEncryptor {
    /// Start a new encryption with a fresh random IV.
    pub fn new(key: &ObjectKey) -> Self {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        Self::with_iv(key, iv)
    }

    /// Start with a caller-chosen IV. The IV must never repeat under the
    /// same key; outside of tests, prefer `new`.
    pub fn with_iv(key: &ObjectKey, iv: [u8; IV_SIZE]) -> Self {
        Self {
            iv,
            keystream: Keystream::new(key, &iv),
        }
    }

    /// The IV prefix to store ahead of the ciphertext.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Encrypt the next plaintext chunk in place.
    pub fn apply(&mut self, buf: &mut [u8]) {
        self.keystream.apply(buf);
    }
}

/// Decrypts one stored object as a forward-only stream of chunks.
///
/// The first 16 fed bytes are consumed as the IV (accumulated across
/// arbitrarily small chunks); everything after decrypts with the counter
/// starting at the IV.
pub struct StreamDecryptor {
    key: ObjectKey,
    iv: [u8; IV_SIZE],
    iv_filled: usize,
    keystream: Option<Keystream>,
}

impl StreamDecryptor {
    pub fn new(key: &ObjectKey) -> Self {
        Self {
            key: key.clone(),
            iv: [0u8; IV_SIZE],
            iv_filled: 0,
            keystream: None,
        }
    }

    /// Feed the next stored chunk; returns the plaintext it yields.
    /// Yields nothing while the IV prefix is still accumulating.
    pub fn update(&mut self, mut chunk: &[u8]) -> Vec<u8> {
        if self.keystream.is_none() {
            let take = (IV_SIZE - self.iv_filled).min(chunk.len());
            self.iv[self.iv_filled..self.iv_filled + take].copy_from_slice(&chunk[..take]);
            self.iv_filled += take;
            chunk = &chunk[take..];
            if self.iv_filled == IV_SIZE {
                self.keystream = Some(Keystream::new(&self.key, &self.iv));
            }
        }

        match self.keystream.as_mut() {
            Some(ks) if !chunk.is_empty() => {
                let mut out = chunk.to_vec();
                ks.apply(&mut out);
                out
            }
            _ => Vec::new(),
        }
    }

    /// Verify the stream carried at least a complete IV prefix.
    pub fn finish(&self) -> Result<(), CryptoError> {
        if self.keystream.is_some() {
            Ok(())
        } else {
            Err(CryptoError::TruncatedObject {
                len: self.iv_filled,
            })
        }
    }
}

/// One-shot encryption of an in-memory buffer: `IV || ciphertext`.
pub fn encrypt_bytes(key: &ObjectKey, plaintext: &[u8]) -> Vec<u8> {
    let mut enc = StreamEncryptor::new(key);
    let mut out = Vec::with_capacity(IV_SIZE + plaintext.len());
    out.extend_from_slice(enc.iv());
    let mut body = plaintext.to_vec();
    enc.apply(&mut body);
    out.extend_from_slice(&body);
    out
}

/// One-shot decryption of a stored `IV || ciphertext` buffer.
pub fn decrypt_bytes(key: &ObjectKey, stored: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut dec = StreamDecryptor::new(key);
    let out = dec.update(stored);
    dec.finish()?;
    Ok(out)
}
