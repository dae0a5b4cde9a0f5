//! Iterators over Array and Object members

use vpack_format::constants::HEAD_COMPACT_OBJECT;
use vpack_format::{Result, VPackError};

use crate::slice::Slice;

/// Iterator over the members of an Array, in storage order
///
/// Members are located by walking byte sizes, which is valid for every
/// array layout since index entries always follow storage order.
pub struct ArrayIterator<'a> {
    container: Slice<'a>,
    position: u64,
    size: u64,
    offset: u64,
}

impl<'a> ArrayIterator<'a> {
    /// Iterator over `container`, which must be an untagged Array
    pub fn new(container: Slice<'a>) -> Result<Self> {
        if !container.is_array() {
            return Err(VPackError::InvalidValueType(
                "Expecting type Array".to_string(),
            ));
        }
        let size = container.member_count()?;
        let offset = if size > 0 {
            container.first_member_offset()?
        } else {
            0
        };
        Ok(Self {
            container,
            position: 0,
            size,
            offset,
        })
    }

    /// Index of the next member
    pub fn index(&self) -> u64 {
        self.position
    }
}

impl<'a> Iterator for ArrayIterator<'a> {
    type Item = Result<Slice<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.size {
            return None;
        }
        self.position += 1;
        let member = match self.container.member_at(self.offset) {
            Ok(member) => member,
            Err(e) => {
                self.position = self.size;
                return Some(Err(e));
            }
        };
        match member.byte_size() {
            Ok(len) => {
                self.offset = self.offset.saturating_add(len);
                Some(Ok(member))
            }
            Err(e) => {
                self.position = self.size;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - self.position) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ArrayIterator<'_> {}

enum Cursor {
    /// Compact objects: next key offset
    Sequential(u64),
    /// Indexed objects: index table base and entry width
    Indexed(u64, usize),
}

/// Iterator over the (key, value) members of an Object, in index table order
pub struct ObjectIterator<'a> {
    container: Slice<'a>,
    cursor: Cursor,
    position: u64,
    size: u64,
    translate: bool,
}

impl<'a> ObjectIterator<'a> {
    /// Iterator over `container`, which must be an untagged Object
    ///
    /// With `translate`, integer keys are replaced by their strings when the
    /// slice carries a translator that knows them.
    pub fn new(container: Slice<'a>, translate: bool) -> Result<Self> {
        if !container.is_object() {
            return Err(VPackError::InvalidValueType(
                "Expecting type Object".to_string(),
            ));
        }
        let size = container.member_count()?;
        let cursor = if size == 0 {
            Cursor::Sequential(0)
        } else if container.raw_head() == HEAD_COMPACT_OBJECT {
            Cursor::Sequential(container.compact_data_offset()?)
        } else {
            let (base, w) = container.index_table(size)?;
            Cursor::Indexed(base, w)
        };
        Ok(Self {
            container,
            cursor,
            position: 0,
            size,
            translate,
        })
    }

    /// Index of the next member
    pub fn index(&self) -> u64 {
        self.position
    }

    fn read_member(&mut self) -> Result<(Slice<'a>, Slice<'a>)> {
        let key_offset = match self.cursor {
            Cursor::Sequential(offset) => offset,
            Cursor::Indexed(base, w) => self.container.index_entry(base, w, self.position)?,
        };
        let key = self.container.member_at(key_offset)?;
        let value_offset = key_offset.saturating_add(key.byte_size()?);
        let value = self.container.member_at(value_offset)?;
        if let Cursor::Sequential(ref mut next) = self.cursor {
            *next = value_offset.saturating_add(value.byte_size()?);
        }
        let key = if self.translate {
            key.translate_lenient()
        } else {
            key
        };
        Ok((key, value))
    }
}

impl<'a> Iterator for ObjectIterator<'a> {
    type Item = Result<(Slice<'a>, Slice<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.size {
            return None;
        }
        let member = self.read_member();
        self.position = if member.is_ok() {
            self.position + 1
        } else {
            self.size
        };
        Some(member)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - self.position) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ObjectIterator<'_> {}
