//! JSON-sidecar metadata catalog.
//!
//! The real metadata service is an external collaborator; this minimal
//! implementation persists one `{prefix}/{id}.json` object per stored
//! object with exactly what the decryption engine needs: plaintext size,
//! base64-encoded key, and the stored object's path. Decoding the key into
//! raw bytes happens here, at the boundary, not in the engine.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use opendal::Operator;
use serde::{Deserialize, Serialize};
use tgw_crypto::ObjectKey;
use zeroize::Zeroize;

/// Per-object metadata record.
#[derive(Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Logical (decrypted) size in bytes
    pub plaintext_size: u64,
    /// Base64-encoded per-object encryption key
    pub key_b64: String,
    /// Path of the stored `IV || ciphertext` object
    pub stored_path: String,
}

impl ObjectRecord {
    pub fn new(plaintext_size: u64, key: &ObjectKey, stored_path: impl Into<String>) -> Self {
        Self {
            plaintext_size,
            key_b64: BASE64_STANDARD.encode(key.as_bytes()),
            stored_path: stored_path.into(),
        }
    }

    /// Decode the transport representation back into a validated key.
    pub fn decode_key(&self) -> Result<ObjectKey> {
        let mut raw = BASE64_STANDARD
            .decode(&self.key_b64)
            .context("object key is not valid base64")?;
        let key = ObjectKey::from_bytes(&raw);
        raw.zeroize();
        key.context("object key has invalid length")
    }
}

impl std::fmt::Debug for ObjectRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRecord")
            .field("plaintext_size", &self.plaintext_size)
            .field("key_b64", &"[REDACTED]")
            .field("stored_path", &self.stored_path)
            .finish()
    }
}

/// Metadata store keyed by object id.
#[derive(Clone)]
pub struct Catalog {
    op: Operator,
    prefix: String,
}

impl Catalog {
    pub fn new(op: Operator, prefix: impl Into<String>) -> Self {
        Self {
            op,
            prefix: prefix.into(),
        }
    }

    fn record_path(&self, id: &str) -> String {
        format!("{}/{id}.json", self.prefix.trim_end_matches('/'))
    }

    /// Load the record for `id`; `None` if no such object is known.
    pub async fn load(&self, id: &str) -> Result<Option<ObjectRecord>> {
        let path = self.record_path(id);
        match self.op.read(&path).await {
            Ok(buf) => {
                let record = serde_json::from_slice(&buf.to_bytes())
                    .with_context(|| format!("parsing metadata record: {path}"))?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading metadata record: {path}")),
        }
    }

    pub async fn save(&self, id: &str, record: &ObjectRecord) -> Result<()> {
        let path = self.record_path(id);
        let json = serde_json::to_vec(record).context("serializing metadata record")?;
        self.op
            .write(&path, json)
            .await
            .map(|_| ())
            .with_context(|| format!("writing metadata record: {path}"))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id);
        self.op
            .delete(&path)
            .await
            .with_context(|| format!("deleting metadata record: {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgw_crypto::generate_key;

    fn memory_catalog() -> Catalog {
        let op = Operator::new(opendal::services::Memory::default())
            .expect("memory operator")
            .finish();
        Catalog::new(op, "meta")
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let catalog = memory_catalog();
        let key = generate_key();
        let record = ObjectRecord::new(1_048_576, &key, "objects/vid-1");

        catalog.save("vid-1", &record).await.unwrap();
        let loaded = catalog.load("vid-1").await.unwrap().expect("record exists");

        assert_eq!(loaded.plaintext_size, 1_048_576);
        assert_eq!(loaded.stored_path, "objects/vid-1");
        assert_eq!(loaded.decode_key().unwrap().as_bytes(), key.as_bytes());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let catalog = memory_catalog();
        assert!(catalog.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let catalog = memory_catalog();
        let record = ObjectRecord::new(10, &generate_key(), "objects/x");
        catalog.save("x", &record).await.unwrap();
        catalog.delete("x").await.unwrap();
        assert!(catalog.load("x").await.unwrap().is_none());
    }

    #[test]
    fn test_decode_key_rejects_bad_base64() {
        let record = ObjectRecord {
            plaintext_size: 1,
            key_b64: "not!!base64".into(),
            stored_path: "objects/y".into(),
        };
        assert!(record.decode_key().is_err());
    }

    #[test]
    fn test_decode_key_rejects_wrong_length() {
        let record = ObjectRecord {
            plaintext_size: 1,
            key_b64: BASE64_STANDARD.encode([0u8; 20]),
            stored_path: "objects/z".into(),
        };
        assert!(record.decode_key().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let record = ObjectRecord::new(5, &generate_key(), "objects/w");
        let debug = format!("{record:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&record.key_b64));
    }
}
