//! Stable hashing
//!
//! `std::hash::DefaultHasher` is randomly seeded per process, which would make
//! expression ids and formula codes differ between runs. FNV-1a is fixed.

use std::hash::Hasher;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hasher with a fixed seed
#[derive(Debug, Clone, Copy)]
pub struct StableHasher {
    state: u64,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }
}

impl StableHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a tag byte followed by a length-prefixed string, so that adjacent
    /// strings cannot be confused with each other.
    pub fn write_tagged_str(&mut self, tag: u8, s: &str) {
        self.write(&[tag]);
        self.write_le_u64(s.len() as u64);
        self.write(s.as_bytes());
    }

    /// Little-endian on every platform, unlike `Hasher::write_u64`.
    pub fn write_le_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }
}

impl Hasher for StableHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Digest of a byte string
pub fn digest(bytes: &[u8]) -> u64 {
    let mut hasher = StableHasher::new();
    hasher.write(bytes);
    hasher.finish()
}
