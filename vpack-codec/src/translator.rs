//! Attribute translation between integer ids and key strings
//!
//! Objects may store a key as a small unsigned integer instead of a string.
//! An [`AttributeTranslator`] maps those ids to their strings and back. It is
//! filled once and then shared read-only between builders and readers.

use ahash::AHashMap;
use vpack_format::{Result, VPackError};

use crate::slice::Slice;
use crate::value::encode_string;

/// Bidirectional dictionary of integer ids and key strings
#[derive(Debug, Default, Clone)]
pub struct AttributeTranslator {
    /// Key string to id
    ids: AHashMap<String, u64>,
    /// Id to the encoded String value of its key
    keys: AHashMap<u64, Box<[u8]>>,
}

impl AttributeTranslator {
    /// Create an empty translator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under `id`
    ///
    /// Both the key and the id must be unused.
    pub fn add(&mut self, key: &str, id: u64) -> Result<()> {
        if self.ids.contains_key(key) || self.keys.contains_key(&id) {
            return Err(VPackError::DuplicateAttributeName);
        }
        let mut encoded = Vec::with_capacity(key.len() + 9);
        encode_string(&mut encoded, key);
        self.ids.insert(key.to_string(), id);
        self.keys.insert(id, encoded.into_boxed_slice());
        Ok(())
    }

    /// Id registered for `key`
    pub fn id_of(&self, key: &str) -> Option<u64> {
        self.ids.get(key).copied()
    }

    /// Key string registered for `id`, as a String slice
    pub fn key_of(&self, id: u64) -> Option<Slice<'_>> {
        self.keys.get(&id).map(|bytes| Slice::new(bytes))
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no key is registered
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
