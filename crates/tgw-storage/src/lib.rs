//! tgw-storage: OpenDAL storage abstraction for TideGate
//!
//! `operator` builds the S3 operator, `store` wraps it in the two read
//! operations the decryption engine relies on (full fetch and inclusive
//! range fetch), and `catalog` is the minimal JSON-sidecar stand-in for the
//! external metadata service.

pub mod catalog;
pub mod health;
pub mod operator;
pub mod store;

pub use catalog::{Catalog, ObjectRecord};
pub use health::check_health;
pub use operator::{build_operator, StorageConfig};
pub use store::{ChunkStream, ObjectStore, FETCH_CHUNK_SIZE};
