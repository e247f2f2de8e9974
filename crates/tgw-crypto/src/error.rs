use thiserror::Error;

/// Failure modes of the encryption layer.
///
/// Callers branch on the variant, never on message text: the gateway maps
/// `InvalidKeyLength`/`TooShort` to client errors and everything else to an
/// opaque server error. Messages never contain key bytes, IVs, or plaintext.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: {0} bytes (expected 16, 24, or 32)")]
    InvalidKeyLength(usize),

    #[error("sealed payload too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("authentication failed: wrong key or tampered payload")]
    AuthenticationFailed,

    #[error("stored object truncated: {len} bytes, shorter than the IV prefix")]
    TruncatedObject { len: usize },

    #[error("cipher failure: {0}")]
    Cipher(&'static str),
}
