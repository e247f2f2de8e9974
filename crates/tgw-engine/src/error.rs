use tgw_crypto::CryptoError;
use thiserror::Error;

/// Failure modes of the decryption engine and range adapter.
///
/// The gateway branches on the variant: `RangeNotSatisfiable` becomes a 416
/// carrying the object's total size, `MalformedRange` a client error, and
/// everything else an opaque server error. A `MidStreamAbort` surfaces as an
/// item on an already-running stream — the response header is committed at
/// that point, so it can only be logged and the connection terminated.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("range not satisfiable for object of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("malformed range header: {0:?}")]
    MalformedRange(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] anyhow::Error),

    #[error("stream aborted mid-read: {0}")]
    MidStreamAbort(#[from] std::io::Error),

    #[error("client stream error: {0}")]
    Client(String),
}
