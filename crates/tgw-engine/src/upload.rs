//! Encrypt-on-write upload pipeline.
//!
//! The request body streams through the CTR encryptor into the object
//! store's streaming writer: IV first, then each chunk encrypted in place.
//! Nothing is buffered beyond one chunk.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tgw_crypto::{ObjectKey, StreamEncryptor, IV_SIZE};
use tgw_storage::ObjectStore;
use tracing::debug;

use crate::error::EngineError;

/// Result of a completed encrypted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub plaintext_size: u64,
    pub stored_size: u64,
}

/// Encrypt `body` on the fly and store it as `IV || ciphertext`.
pub async fn encrypt_upload<S, E>(
    store: &ObjectStore,
    key: &ObjectKey,
    stored_path: &str,
    mut body: S,
) -> Result<UploadOutcome, EngineError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut encryptor = StreamEncryptor::new(key);
    let mut writer = store.writer(stored_path).await?;

    writer
        .write(Bytes::copy_from_slice(encryptor.iv()))
        .await
        .map_err(anyhow::Error::from)?;

    let mut plaintext_size: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| EngineError::Client(e.to_string()))?;
        if chunk.is_empty() {
            continue;
        }
        plaintext_size += chunk.len() as u64;

        let mut buf = chunk.to_vec();
        encryptor.apply(&mut buf);
        writer
            .write(Bytes::from(buf))
            .await
            .map_err(anyhow::Error::from)?;
    }

    writer.close().await.map_err(anyhow::Error::from)?;

    let outcome = UploadOutcome {
        plaintext_size,
        stored_size: plaintext_size + IV_SIZE as u64,
    };
    debug!(
        path = stored_path,
        plaintext = outcome.plaintext_size,
        stored = outcome.stored_size,
        "encrypted upload complete"
    );
    Ok(outcome)
}
