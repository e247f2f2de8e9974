//! tgw-engine: range-aware decryption over remote encrypted objects
//!
//! The engine answers one question: given a stored `IV || ciphertext`
//! object and a logical plaintext range `[start, end]`, produce exactly
//! those bytes while fetching the minimum necessary ciphertext. It never
//! materializes the whole object; every read constructs its own keystream
//! from immutable inputs (key, IV, computed offsets), so concurrent reads
//! share nothing and cancellation is just dropping the stream.
//!
//! Pipeline per ranged read:
//! ```text
//! range header ──▶ RangePlan ──▶ RangeWindow (block/counter math)
//!                                    │
//!      IV prefix fetch [0,15] ◀──────┤
//!      bulk fetch [fetch_start, fetch_end] ◀──
//!                                    │
//!        CTR keystream @ iv+block ──▶ XOR ──▶ trim ──▶ client
//! ```

pub mod engine;
pub mod error;
pub mod range;
pub mod upload;
pub mod window;

pub use engine::{decrypt_full, decrypt_range, fetch_iv, PlainStream};
pub use error::EngineError;
pub use range::{plan_request, RangePlan};
pub use upload::{encrypt_upload, UploadOutcome};
pub use window::RangeWindow;
