//! Key validation and CTR keystream construction.
//!
//! CTR mode only ever block-encrypts counter values, so no block-decrypt
//! capability is exposed. The key length picks the AES variant: 16 bytes
//! for AES-128, 24 for AES-192, 32 for AES-256; anything else is rejected
//! outright, never truncated or padded.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes192, Aes256};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::IV_SIZE;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes192Ctr = ctr::Ctr128BE<Aes192>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A validated per-object encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct ObjectKey {
    bytes: Vec<u8>,
}

impl ObjectKey {
    /// Accepts exactly 16, 24, or 32 bytes of key material.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self {
                bytes: bytes.to_vec(),
            }),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for ObjectKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit object key.
pub fn generate_key() -> ObjectKey {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let key = ObjectKey {
        bytes: bytes.to_vec(),
    };
    bytes.zeroize();
    key
}

enum Inner {
    Aes128(Aes128Ctr),
    Aes192(Aes192Ctr),
    Aes256(Aes256Ctr),
}

/// An AES-CTR keystream positioned at a given counter value.
///
/// `apply` XORs the keystream into a buffer in place; in CTR mode that is
/// both encryption and decryption. State advances with every call, so one
/// keystream serves exactly one pass over one contiguous byte run.
pub struct Keystream {
    inner: Inner,
}

impl Keystream {
    /// Build a keystream for `key` starting at `counter` (a full 16-byte
    /// big-endian counter block; the object IV for position zero).
    pub fn new(key: &ObjectKey, counter: &[u8; IV_SIZE]) -> Self {
        let counter = GenericArray::from_slice(counter);
        // Key length was validated at ObjectKey construction.
        let inner = match key.as_bytes().len() {
            16 => Inner::Aes128(Aes128Ctr::new(
                GenericArray::from_slice(key.as_bytes()),
                counter,
            )),
            24 => Inner::Aes192(Aes192Ctr::new(
                GenericArray::from_slice(key.as_bytes()),
                counter,
            )),
            _ => Inner::Aes256(Aes256Ctr::new(
                GenericArray::from_slice(key.as_bytes()),
                counter,
            )),
        };
        Self { inner }
    }

    /// XOR the next `buf.len()` keystream bytes into `buf`.
    pub fn apply(&mut self, buf: &mut [u8]) {
        match &mut self.inner {
            Inner::Aes128(c) => c.apply_keystream(buf),
            Inner::Aes192(c) => c.apply_keystream(buf),
            Inner::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_valid_lengths() {
        for len in [16, 24, 32] {
            assert!(ObjectKey::from_bytes(&vec![0u8; len]).is_ok(), "len {len}");
        }
    }

    #[test]
    fn test_key_invalid_lengths() {
        for len in [0, 10, 17, 20, 48] {
            let result = ObjectKey::from_bytes(&vec![0u8; len]);
            assert!(
                matches!(result, Err(CryptoError::InvalidKeyLength(n)) if n == len),
                "len {len} must be rejected"
            );
        }
    }

    #[test]
    fn test_generate_key_is_random() {
        let k1 = generate_key();
        let k2 = generate_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = generate_key();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        for byte in key.as_bytes() {
            // No raw byte rendering in debug output
            assert!(!debug.contains(&format!("{byte:#04x}")));
        }
    }

    #[test]
    fn test_keystream_is_deterministic() {
        let key = ObjectKey::from_bytes(&[7u8; 32]).unwrap();
        let counter = [3u8; IV_SIZE];

        let mut a = vec![0u8; 100];
        let mut b = vec![0u8; 100];
        Keystream::new(&key, &counter).apply(&mut a);
        Keystream::new(&key, &counter).apply(&mut b);

        assert_eq!(a, b);
        assert_ne!(a, vec![0u8; 100], "keystream must not be all zeros");
    }

    #[test]
    fn test_keystream_split_application_matches_whole() {
        let key = ObjectKey::from_bytes(&[9u8; 24]).unwrap();
        let counter = [0u8; IV_SIZE];
        let data = (0..255u8).collect::<Vec<u8>>();

        let mut whole = data.clone();
        Keystream::new(&key, &counter).apply(&mut whole);

        let mut split = data.clone();
        let mut ks = Keystream::new(&key, &counter);
        let (head, tail) = split.split_at_mut(37);
        ks.apply(head);
        ks.apply(tail);

        assert_eq!(whole, split);
    }

    #[test]
    fn test_keystream_differs_per_variant() {
        let counter = [0u8; IV_SIZE];
        let mut out128 = vec![0u8; 32];
        let mut out256 = vec![0u8; 32];
        let k128 = ObjectKey::from_bytes(&[1u8; 16]).unwrap();
        let k256 = ObjectKey::from_bytes(&[1u8; 32]).unwrap();
        Keystream::new(&k128, &counter).apply(&mut out128);
        Keystream::new(&k256, &counter).apply(&mut out256);
        assert_ne!(out128, out256);
    }
}
