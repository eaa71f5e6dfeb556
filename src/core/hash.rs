//! Versioned string hashes used to pick corpus fragments.
//!
//! Every algorithm here is fully defined so a mapping can be reproduced by
//! any implementation from `(seed, attempt, name, corpus, algorithm)`.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HashAlgorithm {
    /// FNV-1a, 64-bit, over UTF-8 bytes. Index is `hash % len`.
    #[default]
    #[serde(rename = "fnv1a-64")]
    Fnv1a64,
    /// First 8 bytes of SHA-256 over UTF-8 bytes, big-endian. Index is `hash % len`.
    #[serde(rename = "sha256")]
    Sha256,
    /// `h = 31 * h + unit` over UTF-16 code units in wrapping 32-bit signed
    /// arithmetic. Index is the non-negative remainder `h mod len`.
    #[serde(rename = "java31")]
    Java31,
}

impl HashAlgorithm {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "fnv1a-64" | "fnv1a" => Ok(HashAlgorithm::Fnv1a64),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "java31" => Ok(HashAlgorithm::Java31),
            other => Err(Error::config_invalid_value(
                "hashAlgorithm",
                Some(other.to_string()),
                "Unknown hash algorithm. Use: fnv1a-64, sha256, java31",
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Fnv1a64 => "fnv1a-64",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Java31 => "java31",
        }
    }

    /// Position in a pool of `len` entries. `len` must be non-zero.
    pub fn index(&self, input: &str, len: usize) -> usize {
        match self {
            HashAlgorithm::Fnv1a64 => (fnv1a_64(input) % len as u64) as usize,
            HashAlgorithm::Sha256 => (sha256_u64(input) % len as u64) as usize,
            HashAlgorithm::Java31 => (java31(input) as i64).rem_euclid(len as i64) as usize,
        }
    }
}

pub fn fnv1a_64(input: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut hash = FNV_OFFSET;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn sha256_u64(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

pub fn java31(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}
