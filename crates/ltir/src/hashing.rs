//! Stable fingerprints for nodes, shapes and graph signatures.
//!
//! Every hash here is FNV-1a over little-endian bytes so values stay identical across
//! processes and platforms; they end up inside persisted compiled-graph cache keys.

use std::hash::{Hash, Hasher};

const FNV1A_OFFSET: u64 = 0xcbf29ce484222325;
const FNV1A_PRIME: u64 = 0x100000001b3;

/// Structural hash carried by every node.
pub type HashValue = u64;

/// [`Hasher`] that feeds everything through FNV-1a with fixed-width integer encoding.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintHasher {
    state: u64,
}

impl FingerprintHasher {
    pub fn new() -> Self {
        Self {
            state: fnv1a_init(),
        }
    }

    pub fn write_value<T: Hash + ?Sized>(&mut self, value: &T) {
        value.hash(self);
    }
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FingerprintHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        self.state = fnv1a_bytes(self.state, bytes);
    }

    fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    fn write_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    // usize/isize are widened so 32-bit and 64-bit hosts agree.
    fn write_usize(&mut self, value: usize) {
        self.write_u64(value as u64);
    }

    fn write_i64(&mut self, value: i64) {
        self.write(&value.to_le_bytes());
    }

    fn write_isize(&mut self, value: isize) {
        self.write_i64(value as i64);
    }
}

pub fn hash_value<T: Hash + ?Sized>(value: &T) -> HashValue {
    let mut hasher = FingerprintHasher::new();
    hasher.write_value(value);
    hasher.finish()
}

/// Folds `value` into `seed`; order matters, so `combine(a, b) != combine(b, a)` in general.
pub fn hash_combine(seed: HashValue, value: HashValue) -> HashValue {
    let mut combined = [0u8; 16];
    combined[..8].copy_from_slice(&seed.to_le_bytes());
    combined[8..].copy_from_slice(&value.to_le_bytes());
    fnv1a_hash(&combined)
}

pub fn fnv1a_init() -> u64 {
    FNV1A_OFFSET
}

pub fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV1A_PRIME);
    }
    hash
}

pub fn fnv1a_hash(bytes: &[u8]) -> u64 {
    fnv1a_bytes(fnv1a_init(), bytes)
}
