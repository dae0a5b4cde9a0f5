//! Incremental construction of encoded values
//!
//! A [`Builder`] appends values to an owned buffer. Opening an Array or Object
//! writes a 9-byte placeholder header and pushes a frame recording where each
//! member starts. Closing the container picks the final layout from the
//! collected members, rewrites the header in place and appends the index
//! table.
//!
//! Objects are filled either with [`Builder::add_key`] followed by a value, or
//! with [`Builder::add_keyed`].

use ahash::AHashSet;
use smallvec::SmallVec;
use tracing::trace;
use vpack_format::constants::*;
use vpack_format::endian::{append_uint_le, store_uint_le};
use vpack_format::varint::{encode_uleb128, encode_uleb128_reversed, uleb128_len};
use vpack_format::{Result, VPackError, ValueType};

use crate::shared::SharedSlice;
use crate::slice::Slice;
use crate::translator::AttributeTranslator;
use crate::value::{encode_string, Value};
use crate::Options;

/// An open container
#[derive(Debug)]
struct Frame {
    /// Position of the head byte in the buffer
    start: usize,
    is_object: bool,
    compact: bool,
    sorted: bool,
    /// Member starts (keys for objects), relative to `start`
    offsets: Vec<u64>,
    /// Object only: a key has been written and awaits its value
    key_pending: bool,
}

/// Where the next value goes, so a failed append can be undone
#[derive(Debug, Clone, Copy)]
enum Slot {
    Root,
    ArrayMember,
    ObjectValue,
}

/// Append-only emitter of one encoded value
#[derive(Debug, Default)]
pub struct Builder {
    buffer: Vec<u8>,
    stack: Vec<Frame>,
    options: Options,
    root_set: bool,
}

impl Builder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with the given options
    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Options in effect
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Reset to empty for reuse, keeping the allocation
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.stack.clear();
        self.root_set = false;
    }

    /// Whether the innermost open container is an Array
    pub fn is_open_array(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if !frame.is_object)
    }

    /// Whether the innermost open container is an Object
    pub fn is_open_object(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if frame.is_object)
    }

    /// Whether no container is open
    pub fn is_closed(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of open containers
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    // ---- reading back ----

    fn ensure_sealed(&self) -> Result<()> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(VPackError::BuilderNotSealed)
        }
    }

    /// Reader over the built value; None when nothing was added
    pub fn slice(&self) -> Result<Slice<'_>> {
        self.ensure_sealed()?;
        if self.buffer.is_empty() {
            return Ok(Slice::none());
        }
        Ok(match self.options.attribute_translator.as_deref() {
            Some(translator) => Slice::with_translator(&self.buffer, translator),
            None => Slice::new(&self.buffer),
        })
    }

    /// Bytes of the built value
    pub fn start(&self) -> Result<&[u8]> {
        self.ensure_sealed()?;
        Ok(&self.buffer)
    }

    /// Byte length of the built value
    pub fn size(&self) -> Result<usize> {
        self.ensure_sealed()?;
        Ok(self.buffer.len())
    }

    /// Take the built bytes out of the builder
    pub fn steal(self) -> Result<Vec<u8>> {
        self.ensure_sealed()?;
        Ok(self.buffer)
    }

    /// Hand the built value over to reference-counted shared ownership
    pub fn into_shared(self) -> Result<SharedSlice> {
        self.ensure_sealed()?;
        Ok(match self.options.attribute_translator {
            Some(translator) => SharedSlice::with_translator(self.buffer, translator),
            None => SharedSlice::new(self.buffer),
        })
    }

    /// Whether the innermost open Object already holds `key`
    pub fn has_key(&self, key: &str) -> Result<bool> {
        Ok(!self.get_key(key)?.is_none())
    }

    /// Value stored under `key` in the innermost open Object
    ///
    /// Returns the None slice when the key is absent or still awaits its value.
    pub fn get_key(&self, key: &str) -> Result<Slice<'_>> {
        let frame = match self.stack.last() {
            Some(frame) if frame.is_object => frame,
            _ => return Err(VPackError::BuilderNeedOpenObject),
        };
        let translator = self.options.attribute_translator.as_deref();
        let base = &self.buffer[frame.start..];
        let complete = frame.offsets.len() - usize::from(frame.key_pending);
        for &offset in &frame.offsets[..complete] {
            if key_bytes_at(base, translator, offset) != key.as_bytes() {
                continue;
            }
            let data = &base[offset as usize..];
            let key_size = Slice::new(data).byte_size()?;
            let value = &data[key_size as usize..];
            return Ok(match translator {
                Some(t) => Slice::with_translator(value, t),
                None => Slice::new(value),
            });
        }
        Ok(Slice::none())
    }

    // ---- adding values ----

    fn check_value(&self, value: &Value<'_>) -> Result<()> {
        match *value {
            Value::None => Err(VPackError::BuilderUnexpectedType(
                "cannot add a None value".to_string(),
            )),
            Value::External(_) if self.options.disallow_externals => {
                Err(VPackError::BuilderExternalsDisallowed)
            }
            Value::SmallInt(v) if !(-6..=9).contains(&v) => Err(VPackError::NumberOutOfRange),
            _ => Ok(()),
        }
    }

    /// Claim the position for a value without a key
    fn claim_positional(&mut self) -> Result<Slot> {
        let len = self.buffer.len();
        match self.stack.last_mut() {
            None if self.root_set => Err(VPackError::BuilderNeedOpenArray),
            None => Ok(Slot::Root),
            Some(frame) if frame.is_object => {
                if frame.key_pending {
                    frame.key_pending = false;
                    Ok(Slot::ObjectValue)
                } else {
                    Err(VPackError::BuilderNeedOpenArray)
                }
            }
            Some(frame) => {
                frame.offsets.push((len - frame.start) as u64);
                Ok(Slot::ArrayMember)
            }
        }
    }

    fn release(&mut self, slot: Slot) {
        match (slot, self.stack.last_mut()) {
            (Slot::ArrayMember, Some(frame)) => {
                frame.offsets.pop();
            }
            (Slot::ObjectValue, Some(frame)) => frame.key_pending = true,
            _ => {}
        }
    }

    /// Append bytes for one value at the next position, undoing everything on failure
    fn append_with(&mut self, write: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> Result<()> {
        let slot = self.claim_positional()?;
        let mark = self.buffer.len();
        let outcome = write(&mut self.buffer).and_then(|()| self.check_size());
        match outcome {
            Ok(()) => {
                if matches!(slot, Slot::Root) {
                    self.root_set = true;
                }
                Ok(())
            }
            Err(e) => {
                self.buffer.truncate(mark);
                self.release(slot);
                Err(e)
            }
        }
    }

    fn check_size(&self) -> Result<()> {
        if self.buffer.len() as u64 > self.options.limits.max_byte_size {
            return Err(VPackError::LimitExceeded(format!(
                "value exceeds {} bytes",
                self.options.limits.max_byte_size
            )));
        }
        Ok(())
    }

    /// Append a scalar to the open Array, as the pending key's value, or as the root
    pub fn add(&mut self, value: Value<'_>) -> Result<()> {
        self.check_value(&value)?;
        self.append_with(|buf| value.encode(buf))
    }

    /// Write a key into the open Object; the next value added belongs to it
    ///
    /// Keys known to the attribute translator are written as their integer id.
    pub fn add_key(&mut self, key: &str) -> Result<()> {
        let len = self.buffer.len();
        let frame = match self.stack.last_mut() {
            Some(frame) if frame.is_object => frame,
            _ => return Err(VPackError::BuilderNeedOpenObject),
        };
        if frame.key_pending {
            return Err(VPackError::BuilderNeedSubvalue(
                "value for the previous key".to_string(),
            ));
        }
        frame.offsets.push((len - frame.start) as u64);
        frame.key_pending = true;
        let written = match self
            .options
            .attribute_translator
            .as_deref()
            .and_then(|t| t.id_of(key))
        {
            Some(id) => Value::uint(id).encode(&mut self.buffer),
            None => {
                encode_string(&mut self.buffer, key);
                Ok(())
            }
        };
        if let Err(e) = written.and_then(|()| self.check_size()) {
            self.buffer.truncate(len);
            if let Some(frame) = self.stack.last_mut() {
                frame.offsets.pop();
                frame.key_pending = false;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Append a key and its scalar value to the open Object
    pub fn add_keyed(&mut self, key: &str, value: Value<'_>) -> Result<()> {
        if !self.is_open_object() {
            return Err(VPackError::BuilderNeedOpenObject);
        }
        self.check_value(&value)?;
        self.add_key(key)?;
        self.add(value)
    }

    /// Copy an already encoded value
    pub fn add_slice(&mut self, slice: Slice<'_>) -> Result<()> {
        match slice.kind() {
            ValueType::None => {
                return Err(VPackError::BuilderUnexpectedType(
                    "cannot add a None value".to_string(),
                ))
            }
            ValueType::External if self.options.disallow_externals => {
                return Err(VPackError::BuilderExternalsDisallowed)
            }
            _ => {}
        }
        let size = slice.byte_size()?;
        let bytes = slice.as_bytes();
        if bytes.len() as u64 != size {
            return Err(VPackError::truncated(slice.type_name()));
        }
        self.append_with(|buf| {
            buf.extend_from_slice(bytes);
            Ok(())
        })
    }

    /// Append a complete Custom value (head 0xf0..=0xff)
    pub fn add_custom(&mut self, bytes: &[u8]) -> Result<()> {
        match bytes.first() {
            Some(&head) if head >= HEAD_CUSTOM_FIRST => {}
            _ => {
                return Err(VPackError::BuilderUnexpectedType(
                    "Custom values need a head byte in 0xf0..=0xff".to_string(),
                ))
            }
        }
        if Slice::new(bytes).byte_size()? != bytes.len() as u64 {
            return Err(VPackError::ValidatorInvalidLength(
                "Custom value length does not match its header".to_string(),
            ));
        }
        self.append_with(|buf| {
            buf.extend_from_slice(bytes);
            Ok(())
        })
    }

    /// Append `value` decorated with `tag`
    pub fn add_tagged(&mut self, tag: u64, value: Value<'_>) -> Result<()> {
        self.check_value(&value)?;
        self.append_with(|buf| {
            if tag <= u8::MAX as u64 {
                buf.push(HEAD_TAGGED_1);
                buf.push(tag as u8);
            } else {
                buf.push(HEAD_TAGGED_8);
                append_uint_le(buf, tag, 8);
            }
            value.encode(buf)
        })
    }

    // ---- containers ----

    fn open(&mut self, is_object: bool, compact: bool, sorted: bool) -> Result<()> {
        if self.stack.len() >= self.options.limits.max_depth {
            return Err(VPackError::TooDeepNesting);
        }
        let head = placeholder_head(is_object, compact);
        let start = self.buffer.len();
        self.append_with(|buf| {
            buf.push(head);
            buf.extend_from_slice(&[0u8; CONTAINER_PLACEHOLDER_LEN - 1]);
            Ok(())
        })?;
        self.stack.push(Frame {
            start,
            is_object,
            compact,
            sorted,
            offsets: Vec::new(),
            key_pending: false,
        });
        Ok(())
    }

    /// Open an Array; compact when `build_unindexed_arrays` is set
    pub fn open_array(&mut self) -> Result<()> {
        self.open(false, self.options.build_unindexed_arrays, false)
    }

    /// Open a compact Array
    pub fn open_compact_array(&mut self) -> Result<()> {
        self.open(false, true, false)
    }

    /// Open an Object laid out according to the options
    pub fn open_object(&mut self) -> Result<()> {
        self.open(
            true,
            self.options.build_unindexed_objects,
            self.options.sort_attribute_names,
        )
    }

    /// Open a compact Object
    pub fn open_compact_object(&mut self) -> Result<()> {
        self.open(true, true, false)
    }

    /// Open an Object with an explicit layout
    pub fn open_object_with(&mut self, compact: bool, sorted: bool) -> Result<()> {
        self.open(true, compact, sorted)
    }

    /// Discard the most recent member (or dangling key) of the open container
    pub fn remove_last(&mut self) -> Result<()> {
        let frame = self
            .stack
            .last_mut()
            .ok_or(VPackError::BuilderNeedOpenCompound)?;
        let last = frame
            .offsets
            .pop()
            .ok_or_else(|| VPackError::BuilderNeedSubvalue("no member to remove".to_string()))?;
        frame.key_pending = false;
        let cut = frame.start + last as usize;
        self.buffer.truncate(cut);
        Ok(())
    }

    /// Seal the innermost open container
    pub fn close(&mut self) -> Result<()> {
        let frame = self.stack.pop().ok_or(VPackError::BuilderNeedOpenCompound)?;
        if frame.key_pending {
            self.stack.push(frame);
            return Err(VPackError::BuilderNeedSubvalue(
                "value for the last key".to_string(),
            ));
        }

        if frame.offsets.is_empty() {
            self.buffer.truncate(frame.start);
            self.buffer.push(if frame.is_object {
                HEAD_EMPTY_OBJECT
            } else {
                HEAD_EMPTY_ARRAY
            });
            return Ok(());
        }

        let order = if frame.is_object {
            match self.object_index_order(&frame) {
                Ok(order) => order,
                Err(e) => {
                    self.stack.push(frame);
                    return Err(e);
                }
            }
        } else {
            frame.offsets.clone()
        };

        let payload = self.payload_len(&frame) as usize;
        let header_len = if frame.compact {
            self.close_compact(&frame)
        } else if !frame.is_object && self.has_equal_size_members(&frame) {
            self.close_unindexed_array(&frame)
        } else {
            self.close_indexed(&frame, &order)
        };
        if let Err(e) = self.check_size() {
            self.unseal(&frame, header_len, payload);
            self.stack.push(frame);
            return Err(e);
        }
        Ok(())
    }

    /// Undo a seal: drop the trailing index or count and restore the placeholder
    fn unseal(&mut self, frame: &Frame, header_len: usize, payload: usize) {
        self.buffer.truncate(frame.start + header_len + payload);
        let mut placeholder = [0u8; CONTAINER_PLACEHOLDER_LEN];
        placeholder[0] = placeholder_head(frame.is_object, frame.compact);
        self.buffer
            .splice(frame.start..frame.start + header_len, placeholder);
    }

    /// Index table order of an Object's keys, checking uniqueness if requested
    fn object_index_order(&self, frame: &Frame) -> Result<Vec<u64>> {
        let translator = self.options.attribute_translator.as_deref();
        let base = &self.buffer[frame.start..];
        let mut keys: Vec<(&[u8], u64)> = frame
            .offsets
            .iter()
            .map(|&offset| (key_bytes_at(base, translator, offset), offset))
            .collect();

        if self.options.check_attribute_uniqueness {
            let mut seen = AHashSet::with_capacity(keys.len());
            if !keys.iter().all(|(key, _)| seen.insert(*key)) {
                return Err(VPackError::DuplicateAttributeName);
            }
        }
        if frame.sorted && !frame.compact {
            keys.sort_by(|a, b| a.0.cmp(b.0));
        }
        Ok(keys.into_iter().map(|(_, offset)| offset).collect())
    }

    fn has_equal_size_members(&self, frame: &Frame) -> bool {
        let end = (self.buffer.len() - frame.start) as u64;
        let first = frame.offsets.get(1).copied().unwrap_or(end) - frame.offsets[0];
        frame
            .offsets
            .iter()
            .zip(frame.offsets.iter().skip(1).copied().chain(std::iter::once(end)))
            .all(|(&from, to)| to - from == first)
    }

    fn payload_len(&self, frame: &Frame) -> u64 {
        (self.buffer.len() - frame.start - CONTAINER_PLACEHOLDER_LEN) as u64
    }

    /// Swap the placeholder for the final header, shifting the payload
    fn replace_placeholder(&mut self, start: usize, header: &[u8]) {
        self.buffer.splice(
            start..start + CONTAINER_PLACEHOLDER_LEN,
            header.iter().copied(),
        );
    }

    fn close_compact(&mut self, frame: &Frame) -> usize {
        let n = frame.offsets.len() as u64;
        let payload = self.payload_len(frame);
        let count = encode_uleb128_reversed(n);

        // the byte size includes its own varint, which may need one more byte
        let mut size_len = uleb128_len(1 + payload + count.len() as u64);
        let mut size = 1 + size_len as u64 + payload + count.len() as u64;
        while uleb128_len(size) > size_len {
            size_len += 1;
            size += 1;
        }

        let mut header: SmallVec<[u8; 11]> = SmallVec::new();
        header.push(self.buffer[frame.start]);
        header.extend_from_slice(&encode_uleb128(size));
        self.replace_placeholder(frame.start, &header);
        self.buffer.extend_from_slice(&count);
        trace!(
            head = self.buffer[frame.start],
            members = n,
            byte_size = size,
            "sealed compact container"
        );
        header.len()
    }

    fn close_unindexed_array(&mut self, frame: &Frame) -> usize {
        let payload = self.payload_len(frame);
        let (w, size) = [1usize, 2, 4]
            .into_iter()
            .map(|w| (w, 1 + w as u64 + payload))
            .find(|&(w, size)| fits(size, w))
            .unwrap_or((8, 9 + payload));

        let mut header: SmallVec<[u8; 9]> = SmallVec::new();
        header.push(HEAD_ARRAY_EQUAL_SIZE_1 + w.trailing_zeros() as u8);
        append_small(&mut header, size, w);
        self.replace_placeholder(frame.start, &header);
        trace!(
            head = header[0],
            width = w,
            members = frame.offsets.len(),
            byte_size = size,
            "sealed array without index table"
        );
        header.len()
    }

    fn close_indexed(&mut self, frame: &Frame, order: &[u64]) -> usize {
        let n = order.len() as u64;
        let payload = self.payload_len(frame);
        let (w, header_len, size) = [1usize, 2, 4]
            .into_iter()
            .map(|w| {
                let header_len = 1 + 2 * w;
                (w, header_len, header_len as u64 + payload + n * w as u64)
            })
            .find(|&(w, _, size)| fits(size, w) && fits(n, w))
            .unwrap_or((8, 9, 9 + payload + n * 8 + 8));

        let head = match (frame.is_object, frame.sorted) {
            (false, _) => HEAD_ARRAY_INDEXED_1,
            (true, true) => HEAD_OBJECT_SORTED_1,
            (true, false) => HEAD_OBJECT_UNSORTED_1,
        } + w.trailing_zeros() as u8;

        let mut header: SmallVec<[u8; 9]> = SmallVec::new();
        header.push(head);
        append_small(&mut header, size, w);
        if w < 8 {
            append_small(&mut header, n, w);
        }
        self.replace_placeholder(frame.start, &header);

        let shift = CONTAINER_PLACEHOLDER_LEN as u64 - header_len as u64;
        self.buffer.reserve(order.len() * w + 8);
        for &offset in order {
            append_uint_le(&mut self.buffer, offset - shift, w);
        }
        if w == 8 {
            append_uint_le(&mut self.buffer, n, 8);
        }
        debug_assert_eq!((self.buffer.len() - frame.start) as u64, size);
        trace!(head, width = w, members = n, byte_size = size, "sealed indexed container");
        header_len
    }
}

/// Head byte written into the placeholder of a freshly opened container
fn placeholder_head(is_object: bool, compact: bool) -> u8 {
    match (is_object, compact) {
        (false, false) => HEAD_ARRAY_INDEXED_1,
        (false, true) => HEAD_COMPACT_ARRAY,
        (true, false) => HEAD_OBJECT_SORTED_1,
        (true, true) => HEAD_COMPACT_OBJECT,
    }
}

/// Whether `value` fits an unsigned field of `width` bytes
fn fits(value: u64, width: usize) -> bool {
    width >= 8 || value < 1u64 << (8 * width)
}

fn append_small(out: &mut SmallVec<[u8; 9]>, value: u64, width: usize) {
    let start = out.len();
    out.extend_from_slice(&[0u8; 8][..width]);
    store_uint_le(&mut out[start..], value);
}

/// Bytes a key sorts by; integer keys are translated when possible
fn key_bytes_at<'b>(
    base: &'b [u8],
    translator: Option<&'b AttributeTranslator>,
    offset: u64,
) -> &'b [u8] {
    let data = &base[offset as usize..];
    let key = match translator {
        Some(t) => Slice::with_translator(data, t),
        None => Slice::new(data),
    };
    key.key_bytes().unwrap_or(&[])
}
