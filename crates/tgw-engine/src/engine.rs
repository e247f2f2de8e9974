//! The range-aware decryption engine.
//!
//! Ranged reads never decrypt from the start of the object: the CTR
//! counter for the block containing `start` is reconstructed as
//! `iv + block_number`, the ciphertext window is fetched block-aligned,
//! and the keystream XOR happens chunk-by-chunk as bytes arrive. Full
//! reads skip the seek math and run the plain stream codec instead.

use bytes::Bytes;
use futures::{future, StreamExt, TryStreamExt};
use tgw_crypto::{add_blocks, CryptoError, Keystream, ObjectKey, StreamDecryptor, IV_SIZE};
use tgw_storage::ObjectStore;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::window::RangeWindow;

/// Decrypted plaintext as a chunked byte stream.
pub type PlainStream = futures::stream::BoxStream<'static, Result<Bytes, EngineError>>;

/// Fetch the 16-byte IV prefix of a stored object.
///
/// This is an independent, cheap remote read, separate from the bulk
/// payload fetch; the IV is all the engine needs to position a keystream
/// anywhere in the object.
pub async fn fetch_iv(store: &ObjectStore, stored_path: &str) -> Result<[u8; IV_SIZE], EngineError> {
    let buf = store
        .fetch_range_buf(stored_path, 0, IV_SIZE as u64 - 1)
        .await?;
    if buf.len() != IV_SIZE {
        return Err(CryptoError::TruncatedObject { len: buf.len() }.into());
    }
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&buf);
    Ok(iv)
}

/// Decrypt exactly the plaintext bytes `[start, end]` of a stored object.
///
/// Fetches only the block-aligned ciphertext window covering the range.
/// The returned stream yields `end - start + 1` bytes in order; a remote
/// read failure after the first chunk surfaces as a stream error. The
/// caller's response header is committed by then, so the abort is logged
/// here and the stream simply terminates.
pub async fn decrypt_range(
    store: &ObjectStore,
    key: &ObjectKey,
    stored_path: &str,
    plaintext_size: u64,
    start: u64,
    end: u64,
) -> Result<PlainStream, EngineError> {
    let window = RangeWindow::compute(start, end, plaintext_size)?;

    let iv = fetch_iv(store, stored_path).await?;
    let counter = add_blocks(&iv, window.block_number);
    let mut keystream = Keystream::new(key, &counter);

    debug!(
        start,
        end,
        block = window.block_number,
        fetch_start = window.fetch_start,
        fetch_end = window.fetch_end,
        "ranged decrypt"
    );

    let raw = store
        .fetch_range(stored_path, window.fetch_start, window.fetch_end)
        .await?;

    let mut discard = window.offset_in_block;
    let mut remaining = window.len();
    let stream = raw
        .map(move |chunk| -> Result<Bytes, EngineError> {
            let chunk = chunk.map_err(EngineError::MidStreamAbort)?;

            // The whole fetched chunk goes through the keystream to keep
            // counter alignment; trimming happens after decryption.
            let mut buf = chunk.to_vec();
            keystream.apply(&mut buf);

            let mut out: &[u8] = &buf;
            if discard > 0 {
                // Alignment bytes, possibly spread over several small chunks
                let n = discard.min(out.len());
                out = &out[n..];
                discard -= n;
            }
            let take = remaining.min(out.len() as u64) as usize;
            remaining -= take as u64;
            Ok(Bytes::copy_from_slice(&out[..take]))
        })
        .try_filter(|b| future::ready(!b.is_empty()))
        .inspect_err(|e| warn!(error = %e, "ranged decrypt aborted mid-stream"));

    Ok(stream.boxed())
}

/// Decrypt a whole stored object as a stream, no seeking involved.
pub async fn decrypt_full(
    store: &ObjectStore,
    key: &ObjectKey,
    stored_path: &str,
) -> Result<PlainStream, EngineError> {
    let raw = store.fetch_full(stored_path).await?;
    let decryptor = StreamDecryptor::new(key);

    let stream = futures::stream::try_unfold(
        (raw, decryptor),
        |(mut raw, mut decryptor)| async move {
            match raw.next().await {
                Some(chunk) => {
                    let chunk = chunk.map_err(EngineError::MidStreamAbort)?;
                    let out = decryptor.update(&chunk);
                    Ok(Some((Bytes::from(out), (raw, decryptor))))
                }
                None => {
                    // Catches stored objects shorter than the IV prefix
                    decryptor.finish()?;
                    Ok(None)
                }
            }
        },
    )
    .try_filter(|b| future::ready(!b.is_empty()))
    .inspect_err(|e| warn!(error = %e, "full decrypt aborted mid-stream"));

    Ok(stream.boxed())
}
