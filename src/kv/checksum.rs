//! CRC32 checksum computation for persisted entries
//!
//! Every file read validates the checksum; a mismatch aborts the read.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
