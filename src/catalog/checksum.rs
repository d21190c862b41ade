//! CRC32 over catalog payloads
//!
//! Every catalog read verifies the checksum written with the entry; a
//! mismatch aborts the read.

use crc32fast::Hasher;

pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
