//! Growable byte buffer for append-heavy workloads.
//!
//! `ByteBuffer` is the unit of recycling for the pool: an owned region of
//! bytes that only ever grows its capacity, cleared and reused across
//! acquisitions instead of reallocated.

use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};

/// Initial capacity when streaming into an empty buffer.
const MIN_READ_CAPACITY: usize = 64;

/// Resizable byte region with length ≤ capacity.
///
/// Capacity grows geometrically and never shrinks in place. There is no
/// internal synchronization: a buffer has exactly one owner at a time,
/// which the pool protocol guarantees between `get` and `put`.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: BytesMut,
}

impl ByteBuffer {
    /// Create an empty buffer with no allocation.
    pub fn new() -> Self {
        Self {
            data: BytesMut::new(),
        }
    }

    /// Create an empty buffer pre-sized to `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Current number of bytes held.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current capacity of the backing allocation.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// The current contents as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Append a slice, growing the backing storage as needed.
    #[inline]
    pub fn append(&mut self, src: &[u8]) {
        self.data.extend_from_slice(src);
    }

    /// Append a single byte.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.data.extend_from_slice(&[byte]);
    }

    /// Append the UTF-8 bytes of a string.
    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Drop the contents, keeping the capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Replace the contents with `src`, reusing existing capacity.
    pub fn set(&mut self, src: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(src);
    }

    /// Replace the contents with the UTF-8 bytes of `s`.
    pub fn set_str(&mut self, s: &str) {
        self.set(s.as_bytes());
    }

    /// Copy the current contents into an owned `String`.
    ///
    /// Invalid UTF-8 sequences are replaced. The result is independent of
    /// any later mutation of the buffer.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Append everything `reader` yields until end-of-stream.
    ///
    /// Grows the buffer by doubling, starting from 64 bytes when empty.
    /// Clean end-of-stream is success. On any other read error the bytes
    /// already transferred stay appended (the count is the length delta)
    /// and the error is returned unmodified.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        let start = self.data.len();
        loop {
            if self.data.len() == self.data.capacity() {
                let grow = self.data.capacity().max(MIN_READ_CAPACITY);
                self.data.reserve(grow);
            }
            let len = self.data.len();
            let target = self.data.capacity();
            // Reads land in the spare capacity; truncate back to what the
            // reader actually filled.
            self.data.resize(target, 0);
            match reader.read(&mut self.data[len..]) {
                Ok(0) => {
                    self.data.truncate(len);
                    return Ok((len - start) as u64);
                }
                Ok(n) => self.data.truncate(len + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.data.truncate(len),
                Err(e) => {
                    self.data.truncate(len);
                    return Err(e);
                }
            }
        }
    }

    /// Write the full current contents to `writer`.
    ///
    /// Any sink error is propagated unmodified.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<u64> {
        writer.write_all(&self.data)?;
        Ok(self.data.len() as u64)
    }

    /// Consume the buffer into an immutable `Bytes` without copying.
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

impl std::ops::Deref for ByteBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl Write for ByteBuffer {
    #[inline]
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(src);
        Ok(src.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
