//! Range request adapter: parses `bytes=<start>-<end>` against an object's
//! plaintext size and plans the response shape.
//!
//! Only the single-range form is accepted: `<end>` is optional and defaults
//! to the last byte. Multi-range and suffix (`bytes=-N`) requests are
//! rejected as malformed, a client error distinct from an unsatisfiable
//! but well-formed range.

use crate::error::EngineError;
use crate::window::RangeWindow;

/// How a read request will be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// No range header: whole object, ordinary success
    Full { size: u64 },
    /// Satisfiable byte range: partial content
    Partial { start: u64, end: u64, size: u64 },
}

impl RangePlan {
    /// Bytes the response body will carry.
    pub fn content_length(&self) -> u64 {
        match *self {
            RangePlan::Full { size } => size,
            RangePlan::Partial { start, end, .. } => end - start + 1,
        }
    }

    /// `Content-Range` header value for partial responses.
    pub fn content_range(&self) -> Option<String> {
        match *self {
            RangePlan::Full { .. } => None,
            RangePlan::Partial { start, end, size } => {
                Some(format!("bytes {start}-{end}/{size}"))
            }
        }
    }
}

/// Plan a read given an optional `Range` header value.
///
/// Malformed syntax yields `MalformedRange`; a well-formed range outside
/// the object yields `RangeNotSatisfiable` with the total size attached so
/// the boundary can answer `Content-Range: bytes */<size>`.
pub fn plan_request(range: Option<&str>, plaintext_size: u64) -> Result<RangePlan, EngineError> {
    let Some(header) = range else {
        return Ok(RangePlan::Full {
            size: plaintext_size,
        });
    };

    let (start, end) = parse_range(header, plaintext_size)?;
    // Shares the validity check with the engine's window math
    RangeWindow::compute(start, end, plaintext_size)?;
    Ok(RangePlan::Partial {
        start,
        end,
        size: plaintext_size,
    })
}

fn parse_range(header: &str, plaintext_size: u64) -> Result<(u64, u64), EngineError> {
    let malformed = || EngineError::MalformedRange(header.to_string());

    let rest = header.strip_prefix("bytes=").ok_or_else(malformed)?;
    let (start_str, end_str) = rest.split_once('-').ok_or_else(malformed)?;

    if start_str.is_empty() {
        // Suffix form `bytes=-N` is not supported
        return Err(malformed());
    }

    let start: u64 = start_str.trim().parse().map_err(|_| malformed())?;
    let end: u64 = if end_str.is_empty() {
        plaintext_size.saturating_sub(1)
    } else {
        end_str.trim().parse().map_err(|_| malformed())?
    };

    Ok((start, end))
}
