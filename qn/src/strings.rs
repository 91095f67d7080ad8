//! Chunked strings.
//!
//! A string is a chain of [`Cell::String`] chunks of [`STRING_CHUNK`] bytes.
//! A chunk is full once its last byte is set, the first zero byte ends the
//! content of a chunk. Only the head chunk stays on the root stack while a
//! string is built.
use crate::{Cell, Context, Heap, Kind, Obj, Result, STRING_CHUNK};

/// Logical bytes of a string, independent of chunk boundaries.
#[derive(Debug, Clone)]
pub struct StringBytes<'a> {
    heap: &'a Heap,
    chunk: Obj,
    pos: usize,
}

impl Iterator for StringBytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            let Some(Cell::String { chunk, next }) = self.heap.get(self.chunk) else {
                return None;
            };
            if let Some(&byte) = chunk.get(self.pos).filter(|&&byte| byte != 0) {
                self.pos += 1;
                return Some(byte);
            }
            self.chunk = *next;
            self.pos = 0;
        }
    }
}

impl Heap {
    /// Bytes of the string `object`, empty for any other kind.
    pub fn string_bytes(&self, object: Obj) -> StringBytes<'_> {
        StringBytes {
            heap: self,
            chunk: object,
            pos: 0,
        }
    }

    /// Content equality of two strings.
    pub fn string_eq(&self, a: Obj, b: Obj) -> bool {
        self.kind(a) == Kind::String
            && self.kind(b) == Kind::String
            && self.string_bytes(a).eq(self.string_bytes(b))
    }

    pub fn string_matches(&self, object: Obj, text: &[u8]) -> bool {
        self.kind(object) == Kind::String
            && self
                .string_bytes(object)
                .eq(content(text).iter().copied())
    }

    fn chunk_full(&self, object: Obj) -> bool {
        matches!(
            self.get(object),
            Some(Cell::String { chunk, .. }) if chunk[STRING_CHUNK - 1] != 0
        )
    }
}

/// Bytes up to the first zero, strings cannot carry one.
pub(crate) fn content(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&byte| byte == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

impl Context {
    /// Builds a string, stopping at the first zero byte of `text`.
    pub fn string(&mut self, text: &str) -> Result<Obj> {
        self.string_from_bytes(text.as_bytes())
    }

    pub fn string_from_bytes(&mut self, bytes: &[u8]) -> Result<Obj> {
        let head = self.allocate(Cell::empty_chunk())?;
        let mut tail = head;
        for &byte in content(bytes) {
            tail = self.append_byte(tail, byte)?;
        }
        Ok(head)
    }

    /// Appends `byte` to the chunk `tail` and returns the new tail chunk.
    fn append_byte(&mut self, tail: Obj, byte: u8) -> Result<Obj> {
        let tail = if self.heap.chunk_full(tail) {
            let chunk = self.allocate(Cell::empty_chunk())?;
            if let Some(Cell::String { next, .. }) = self.heap.get_mut(tail) {
                *next = chunk;
            }
            // reachable from the head now
            self.roots.pop();
            chunk
        } else {
            tail
        };

        if let Some(Cell::String { chunk, .. }) = self.heap.get_mut(tail) {
            if let Some(slot) = chunk.iter_mut().find(|slot| **slot == 0) {
                *slot = byte;
            }
        }
        Ok(tail)
    }

    /// Bytes of a string, type-checked.
    pub fn string_value(&mut self, object: Obj) -> Result<Vec<u8>> {
        self.check(object, Kind::String)?;
        Ok(self.heap.string_bytes(object).collect())
    }

    pub fn string_eq(&self, a: Obj, b: Obj) -> bool {
        self.heap.string_eq(a, b)
    }
}
