//! Sealed (authenticated) payloads for small byte strings.
//!
//! Sealed format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! This is a general-purpose primitive for the storage layer (metadata
//! blobs at rest); the bulk object path uses the CTR stream codec instead.
//! The tag is verified before any plaintext is released.

use aes::cipher::consts::U12;
use aes::cipher::generic_array::GenericArray;
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::AesGcm;
use rand::RngCore;

use crate::cipher::ObjectKey;
use crate::error::CryptoError;
use crate::NONCE_SIZE;

type Aes128Gcm = AesGcm<Aes128, U12>;
type Aes192Gcm = AesGcm<Aes192, U12>;
type Aes256Gcm = AesGcm<Aes256, U12>;

/// Encrypt and authenticate a small payload with AES-GCM.
///
/// Returns `[12-byte nonce][ciphertext][16-byte tag]`; always longer than
/// the input, including for empty plaintext.
pub fn seal(key: &ObjectKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = GenericArray::from_slice(&nonce_bytes);

    let kb = key.as_bytes();
    let ciphertext = match kb.len() {
        16 => Aes128Gcm::new(GenericArray::from_slice(kb)).encrypt(nonce, plaintext),
        24 => Aes192Gcm::new(GenericArray::from_slice(kb)).encrypt(nonce, plaintext),
        _ => Aes256Gcm::new(GenericArray::from_slice(kb)).encrypt(nonce, plaintext),
    }
    .map_err(|_| CryptoError::Cipher("AES-GCM seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Verify and decrypt a sealed payload.
///
/// Fails `TooShort` when the payload cannot even hold a nonce, and
/// `AuthenticationFailed` on any tag mismatch (wrong key, or a flipped bit
/// anywhere in nonce, ciphertext, or tag). No partial plaintext escapes.
pub fn open(key: &ObjectKey, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if payload.len() < NONCE_SIZE {
        return Err(CryptoError::TooShort {
            len: payload.len(),
            min: NONCE_SIZE,
        });
    }

    let (nonce_bytes, ciphertext) = payload.split_at(NONCE_SIZE);
    let nonce = GenericArray::from_slice(nonce_bytes);

    let kb = key.as_bytes();
    match kb.len() {
        16 => Aes128Gcm::new(GenericArray::from_slice(kb)).decrypt(nonce, ciphertext),
        24 => Aes192Gcm::new(GenericArray::from_slice(kb)).decrypt(nonce, ciphertext),
        _ => Aes256Gcm::new(GenericArray::from_slice(kb)).decrypt(nonce, ciphertext),
    }
    .map_err(|_| CryptoError::AuthenticationFailed)
}
