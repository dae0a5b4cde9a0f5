//! Reference-counted ownership of a sealed value

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::slice::Slice;
use crate::translator::AttributeTranslator;

/// Immutable, cheaply clonable buffer holding one encoded value
#[derive(Clone)]
pub struct SharedSlice {
    bytes: Bytes,
    translator: Option<Arc<AttributeTranslator>>,
}

impl SharedSlice {
    /// Wrap an encoded value
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            translator: None,
        }
    }

    /// Wrap an encoded value whose integer keys `translator` resolves
    pub fn with_translator(bytes: impl Into<Bytes>, translator: Arc<AttributeTranslator>) -> Self {
        Self {
            bytes: bytes.into(),
            translator: Some(translator),
        }
    }

    /// Reader over the value
    pub fn slice(&self) -> Slice<'_> {
        match &self.translator {
            Some(translator) => Slice::with_translator(&self.bytes, translator),
            None => Slice::new(&self.bytes),
        }
    }

    /// Underlying buffer
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Give up the wrapper and keep the buffer
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl fmt::Debug for SharedSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSlice")
            .field("slice", &self.slice())
            .finish()
    }
}
