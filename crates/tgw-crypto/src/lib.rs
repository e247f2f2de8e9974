//! tgw-crypto: content encryption for TideGate
//!
//! Stored object format (binary):
//! ```text
//! [16 bytes: random IV][N bytes: AES-CTR ciphertext]
//! stored_size = 16 + plaintext_size
//! ```
//!
//! The IV doubles as the initial CTR counter and is not secret; adding the
//! block index of a plaintext offset to it reconstructs the counter for any
//! position, which is what makes range reads seekable without decrypting
//! from the start.
//!
//! Sealed payloads (small metadata blobs) use AES-GCM instead:
//! `[12-byte nonce][ciphertext][16-byte tag]`.

pub mod cipher;
pub mod counter;
pub mod error;
pub mod sealed;
pub mod stream;

pub use cipher::{generate_key, Keystream, ObjectKey};
pub use counter::add_blocks;
pub use error::CryptoError;
pub use sealed::{open, seal};
pub use stream::{decrypt_bytes, encrypt_bytes, StreamDecryptor, StreamEncryptor};

/// AES block size in bytes. The whole seeking algorithm hangs off this.
pub const BLOCK_SIZE: usize = 16;

/// Size of the per-object CTR initialization vector (one AES block)
pub const IV_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
