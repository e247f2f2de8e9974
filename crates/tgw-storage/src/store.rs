//! Object store wrapper: the two read operations the decryption engine
//! relies on, plus the write/stat/delete the gateway needs.
//!
//! Range fetches are inclusive on both ends to match the partial-content
//! semantics upstream; conversion to half-open ranges happens here and
//! nowhere else.

use anyhow::{Context, Result};
use bytes::Bytes;
use opendal::{FuturesBytesStream, Operator, Writer};

/// Fetch chunk size for streamed reads (non-normative; S3 GETs are served
/// in pieces of this size).
pub const FETCH_CHUNK_SIZE: usize = 32 * 1024;

/// A chunked byte stream from the remote store.
pub type ChunkStream = FuturesBytesStream;

/// Read/write access to stored (encrypted) objects.
#[derive(Clone)]
pub struct ObjectStore {
    op: Operator,
}

impl ObjectStore {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    /// Stream the entire stored object, sequentially.
    pub async fn fetch_full(&self, path: &str) -> Result<ChunkStream> {
        let reader = self
            .op
            .reader_with(path)
            .chunk(FETCH_CHUNK_SIZE)
            .await
            .with_context(|| format!("opening reader: {path}"))?;
        reader
            .into_bytes_stream(..)
            .await
            .with_context(|| format!("streaming object: {path}"))
    }

    /// Stream an exact inclusive byte range of the stored object.
    pub async fn fetch_range(&self, path: &str, start: u64, end_inclusive: u64) -> Result<ChunkStream> {
        let reader = self
            .op
            .reader_with(path)
            .chunk(FETCH_CHUNK_SIZE)
            .await
            .with_context(|| format!("opening reader: {path}"))?;
        reader
            .into_bytes_stream(start..end_inclusive + 1)
            .await
            .with_context(|| format!("streaming range {start}-{end_inclusive}: {path}"))
    }

    /// Fetch a small inclusive range into memory (e.g. the 16-byte IV prefix).
    pub async fn fetch_range_buf(&self, path: &str, start: u64, end_inclusive: u64) -> Result<Bytes> {
        let buf = self
            .op
            .read_with(path)
            .range(start..end_inclusive + 1)
            .await
            .with_context(|| format!("reading range {start}-{end_inclusive}: {path}"))?;
        Ok(buf.to_bytes())
    }

    /// Write a whole object in one call.
    pub async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        self.op
            .write(path, data)
            .await
            .map(|_| ())
            .with_context(|| format!("writing object: {path}"))
    }

    /// Open a streaming writer for incremental upload.
    pub async fn writer(&self, path: &str) -> Result<Writer> {
        self.op
            .writer(path)
            .await
            .with_context(|| format!("opening writer: {path}"))
    }

    /// Size of the stored object in bytes.
    pub async fn stored_size(&self, path: &str) -> Result<u64> {
        let meta = self
            .op
            .stat(path)
            .await
            .with_context(|| format!("stat: {path}"))?;
        Ok(meta.content_length())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.op
            .delete(path)
            .await
            .with_context(|| format!("deleting object: {path}"))
    }
}
