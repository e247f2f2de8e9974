//! Block/offset geometry for a ranged read of a stored object.

use tgw_crypto::{BLOCK_SIZE, IV_SIZE};

use crate::error::EngineError;

/// Where a logical plaintext range lands inside the stored
/// `IV || ciphertext` object.
///
/// The fetch window always starts on a cipher-block boundary even when
/// `start` does not, so the keystream lines up; the `offset_in_block`
/// leading bytes of the first decrypted block are fetched only for
/// alignment and must be discarded before emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    /// First requested plaintext byte (inclusive)
    pub start: u64,
    /// Last requested plaintext byte (inclusive)
    pub end: u64,
    /// Logical size of the whole plaintext object
    pub plaintext_size: u64,
    /// Index of the cipher block containing `start`
    pub block_number: u64,
    /// Leading bytes of that block to discard after decryption
    pub offset_in_block: usize,
    /// First stored byte to fetch (past the IV prefix, block-aligned)
    pub fetch_start: u64,
    /// Last stored byte to fetch (inclusive)
    pub fetch_end: u64,
}

impl RangeWindow {
    /// Validate the range and derive the fetch geometry.
    pub fn compute(start: u64, end: u64, plaintext_size: u64) -> Result<Self, EngineError> {
        if start > end || end >= plaintext_size {
            return Err(EngineError::RangeNotSatisfiable {
                size: plaintext_size,
            });
        }

        let block_number = start / BLOCK_SIZE as u64;
        let offset_in_block = (start % BLOCK_SIZE as u64) as usize;

        Ok(Self {
            start,
            end,
            plaintext_size,
            block_number,
            offset_in_block,
            fetch_start: IV_SIZE as u64 + block_number * BLOCK_SIZE as u64,
            fetch_end: IV_SIZE as u64 + end,
        })
    }

    /// Number of plaintext bytes the client asked for.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Inclusive, validated ranges always hold at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_start() {
        let w = RangeWindow::compute(32, 63, 100).unwrap();
        assert_eq!(w.block_number, 2);
        assert_eq!(w.offset_in_block, 0);
        assert_eq!(w.fetch_start, 16 + 32);
        assert_eq!(w.fetch_end, 16 + 63);
        assert_eq!(w.len(), 32);
    }

    #[test]
    fn test_unaligned_start_rounds_down() {
        // start=10 sits in block 0 at offset 10
        let w = RangeWindow::compute(10, 19, 62).unwrap();
        assert_eq!(w.block_number, 0);
        assert_eq!(w.offset_in_block, 10);
        assert_eq!(w.fetch_start, 16);
        assert_eq!(w.fetch_end, 16 + 19);
        assert_eq!(w.len(), 10);
    }

    #[test]
    fn test_mid_file_unaligned() {
        let w = RangeWindow::compute(500_000, 500_099, 1_048_576).unwrap();
        assert_eq!(w.block_number, 31_250);
        assert_eq!(w.offset_in_block, 0);
        assert_eq!(w.fetch_start, 16 + 500_000);
        assert_eq!(w.fetch_end, 16 + 500_099);

        let w = RangeWindow::compute(500_007, 500_099, 1_048_576).unwrap();
        assert_eq!(w.offset_in_block, 7);
        assert_eq!(w.fetch_start, 16 + 500_000, "fetch start stays block-aligned");
    }

    #[test]
    fn test_single_byte_range() {
        let w = RangeWindow::compute(17, 17, 18).unwrap();
        assert_eq!(w.len(), 1);
        assert_eq!(w.block_number, 1);
        assert_eq!(w.offset_in_block, 1);
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        for (start, end, size) in [(5, 4, 100), (100, 100, 100), (0, 100, 100), (0, 0, 0)] {
            let result = RangeWindow::compute(start, end, size);
            assert!(
                matches!(result, Err(EngineError::RangeNotSatisfiable { size: s }) if s == size),
                "({start},{end}) of {size} must be unsatisfiable"
            );
        }
    }
}
