//! Registry of buffers referenced by External values
//!
//! An External value (head 0x1d) carries an 8-byte handle. The handle is the
//! position of a buffer in an [`ExternalTable`] owned by the caller, so that
//! following an External never dereferences a raw address.

use bytes::Bytes;
use vpack_format::{Result, VPackError};

use crate::slice::Slice;

/// Append-only table of encoded values addressed by handle
#[derive(Debug, Default, Clone)]
pub struct ExternalTable {
    buffers: Vec<Bytes>,
}

impl ExternalTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an encoded value and return its handle
    pub fn insert(&mut self, value: impl Into<Bytes>) -> u64 {
        self.buffers.push(value.into());
        (self.buffers.len() - 1) as u64
    }

    /// Buffer registered under `handle`
    pub fn get(&self, handle: u64) -> Option<&Bytes> {
        usize::try_from(handle)
            .ok()
            .and_then(|index| self.buffers.get(index))
    }

    /// Slice over the value registered under `handle`
    pub fn resolve(&self, handle: u64) -> Result<Slice<'_>> {
        self.get(handle)
            .map(|bytes| Slice::new(bytes))
            .ok_or_else(|| {
                VPackError::InvalidValueType(format!("unknown external handle {}", handle))
            })
    }

    /// Number of registered buffers
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
