//! Binary and normalized hashing of values
//!
//! [`Slice::hash`] hashes the raw encoding, so two encodings of the same
//! logical value hash differently. [`Slice::normalized_hash`] hashes the
//! logical value: every number is hashed as a double, strings by content and
//! objects independently of member order.

use std::sync::OnceLock;

use vpack_format::constants::DEFAULT_SEED;
use vpack_format::tables::FIXED_LENGTH;
use vpack_format::{Result, ValueType};
use xxhash_rust::xxh64::xxh64;

use crate::slice::Slice;

const ARRAY_SALT: u64 = 0xba5b_edf0_0d;
const OBJECT_SALT: u64 = 0xf0_0ba4_4ba5;

/// XXH64 of `bytes` with `seed`
pub fn hash_bytes(bytes: &[u8], seed: u64) -> u64 {
    xxh64(bytes, seed)
}

/// Hashes of all one-byte values under [`DEFAULT_SEED`]
fn one_byte_hashes() -> &'static [u64; 256] {
    static TABLE: OnceLock<[u64; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u64; 256];
        for (head, slot) in table.iter_mut().enumerate() {
            if FIXED_LENGTH[head] == 1 {
                *slot = hash_bytes(&[head as u8], DEFAULT_SEED);
            }
        }
        table
    })
}

impl Slice<'_> {
    /// Hash of the raw encoding, tags included
    pub fn hash(&self, seed: u64) -> Result<u64> {
        let bytes = self.as_bytes();
        let size = self.byte_size()?;
        if size == 1 && seed == DEFAULT_SEED {
            return Ok(one_byte_hashes()[self.raw_head() as usize]);
        }
        Ok(hash_bytes(bytes, seed))
    }

    /// [`Slice::hash`] with [`DEFAULT_SEED`]
    pub fn hash_default(&self) -> Result<u64> {
        self.hash(DEFAULT_SEED)
    }

    /// Hash of a String's payload
    pub fn hash_string(&self, seed: u64) -> Result<u64> {
        Ok(hash_bytes(self.get_string_bytes()?, seed))
    }

    /// Hash that agrees for logically equal values
    ///
    /// Tags are ignored. Integer keys are translated when possible.
    pub fn normalized_hash(&self, seed: u64) -> Result<u64> {
        let v = self.value();
        match v.kind() {
            ValueType::Int | ValueType::UInt | ValueType::SmallInt | ValueType::Double => {
                let d = v.get_number::<f64>()?;
                Ok(hash_bytes(&d.to_bits().to_le_bytes(), seed))
            }
            ValueType::String => v.hash_string(seed),
            ValueType::Array => {
                let iter = v.array_iter()?;
                let n = iter.len() as u64 ^ ARRAY_SALT;
                let mut value = hash_bytes(&n.to_le_bytes(), seed);
                for member in iter {
                    value ^= member?.normalized_hash(value)?;
                }
                Ok(value)
            }
            ValueType::Object => {
                let iter = v.object_iter()?;
                let n = iter.len() as u64 ^ OBJECT_SALT;
                let object_seed = hash_bytes(&n.to_le_bytes(), seed);
                let mut value = object_seed;
                for member in iter {
                    let (key, member_value) = member?;
                    let key_seed = key.normalized_hash(object_seed)?;
                    value ^= key_seed;
                    value ^= member_value.normalized_hash(key_seed)?;
                }
                Ok(value)
            }
            _ => v.hash(seed),
        }
    }

    /// [`Slice::normalized_hash`] with [`DEFAULT_SEED`]
    pub fn normalized_hash_default(&self) -> Result<u64> {
        self.normalized_hash(DEFAULT_SEED)
    }
}
