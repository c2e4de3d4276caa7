use std::fs;
use std::io;
use std::path::Path;

use bytemuck::{AnyBitPattern, NoUninit};

/// Capacity of a buffer created with [`ByteBuffer::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Failure while decoding from a [`ByteBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ByteBufferError {
    #[error("read of {requested} bytes at position {position} overruns {size} written bytes")]
    UnexpectedEnd {
        position: usize,
        requested: usize,
        size: usize,
    },

    #[error("string of {0} bytes does not fit a u16 length prefix")]
    StringTooLong(usize),

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Growable byte array with a single read/write cursor.
///
/// Invariant: `position <= len() <= capacity()`.
///
/// Performance characteristics:
/// - writes are amortized O(1); capacity doubles until the pending write fits
/// - `clear()` keeps the allocation, so a buffer reused every frame stops allocating once warmed
/// - reads are bounds-checked against the written size, never the capacity
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    /// Backing storage. `data.len()` is the capacity; bytes past `size` are scratch.
    data: Vec<u8>,
    size: usize,
    position: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ByteBuffer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            size: 0,
            position: 0,
        }
    }

    /// Creates a buffer holding a copy of `bytes`, cursor at the beginning.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buffer = Self::with_capacity(bytes.len().max(DEFAULT_CAPACITY));
        buffer.write_bulk(bytes);
        buffer.seek_to_beg();
        buffer
    }

    /// Number of bytes written.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes between the cursor and the end of the written region.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.size - self.position
    }

    /// The written region.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    // ── writing ──────────────────────────────────────────────────────────────

    /// Writes the bytes of `value` at the cursor and advances it.
    #[inline]
    pub fn write<T: NoUninit>(&mut self, value: T) {
        self.write_bulk(bytemuck::bytes_of(&value));
    }

    /// Writes raw bytes at the cursor and advances it.
    ///
    /// Writing after a seek overwrites in place; the written size only grows
    /// when the cursor passes the previous end.
    pub fn write_bulk(&mut self, bytes: &[u8]) {
        self.grow_for(bytes.len());
        let end = self.position + bytes.len();
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
        self.size = self.size.max(end);
    }

    /// Writes a u16 length prefix followed by the UTF-8 bytes of `value`.
    pub fn write_str(&mut self, value: &str) -> Result<(), ByteBufferError> {
        let len = u16::try_from(value.len()).map_err(|_| ByteBufferError::StringTooLong(value.len()))?;
        self.write(len);
        self.write_bulk(value.as_bytes());
        Ok(())
    }

    fn grow_for(&mut self, additional: usize) {
        let needed = self.position + additional;
        if needed <= self.data.len() {
            return;
        }

        let mut capacity = self.data.len().max(1);
        while capacity < needed {
            capacity *= 2;
        }
        self.data.resize(capacity, 0);
    }

    // ── reading ──────────────────────────────────────────────────────────────

    /// Reads a `T` from the cursor (unaligned) and advances it.
    #[inline]
    pub fn read<T: AnyBitPattern>(&mut self) -> Result<T, ByteBufferError> {
        let bytes = self.read_bytes(size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Fills `dst` from the cursor and advances it.
    pub fn read_bulk(&mut self, dst: &mut [u8]) -> Result<(), ByteBufferError> {
        let src = self.read_bytes(dst.len())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Borrows the next `len` bytes in place and advances past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8], ByteBufferError> {
        self.check_available(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    /// Reads a string written by [`ByteBuffer::write_str`].
    pub fn read_str(&mut self) -> Result<String, ByteBufferError> {
        let len = self.read::<u16>()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }

    fn check_available(&self, len: usize) -> Result<(), ByteBufferError> {
        match self.position.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(ByteBufferError::UnexpectedEnd {
                position: self.position,
                requested: len,
                size: self.size,
            }),
        }
    }

    // ── cursor ───────────────────────────────────────────────────────────────

    #[inline]
    pub fn seek_to_beg(&mut self) {
        self.position = 0;
    }

    #[inline]
    pub fn seek_to_end(&mut self) {
        self.position = self.size;
    }

    /// Moves the cursor forward without reading.
    pub fn advance(&mut self, len: usize) -> Result<(), ByteBufferError> {
        self.check_available(len)?;
        self.position += len;
        Ok(())
    }

    /// Resets size and cursor. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.size = 0;
        self.position = 0;
    }

    /// Reallocates to exactly `capacity` bytes, truncating written data if shrinking.
    pub fn resize(&mut self, capacity: usize) {
        self.data.resize(capacity, 0);
        self.size = self.size.min(capacity);
        self.position = self.position.min(self.size);
    }

    /// Overwrites every written byte with `value`.
    pub fn fill(&mut self, value: u8) {
        self.data[..self.size].fill(value);
    }

    // ── files ────────────────────────────────────────────────────────────────

    /// Writes the written region to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.as_slice())
    }

    /// Loads a file into a new buffer, cursor at the beginning.
    pub fn read_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_sample(buffer: &mut ByteBuffer) {
        buffer.write(7u32);
        buffer.write(-3i16);
        buffer.write(1.5f32);
        buffer.write([1u8, 2, 3]);
        buffer.write(u64::MAX);
    }

    // ── round trips ──────────────────────────────────────────────────────────

    #[test]
    fn typed_reads_return_written_values() {
        let mut buffer = ByteBuffer::new();
        write_sample(&mut buffer);
        buffer.seek_to_beg();

        assert_eq!(buffer.read::<u32>().unwrap(), 7);
        assert_eq!(buffer.read::<i16>().unwrap(), -3);
        assert_eq!(buffer.read::<f32>().unwrap().to_bits(), 1.5f32.to_bits());
        assert_eq!(buffer.read::<[u8; 3]>().unwrap(), [1, 2, 3]);
        assert_eq!(buffer.read::<u64>().unwrap(), u64::MAX);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn clear_then_rewrite_reproduces_contents() {
        let mut buffer = ByteBuffer::new();
        write_sample(&mut buffer);
        let first = buffer.as_slice().to_vec();
        let capacity = buffer.capacity();

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);

        write_sample(&mut buffer);
        assert_eq!(buffer.as_slice(), first.as_slice());
    }

    #[test]
    fn bulk_and_string_round_trip() {
        let mut buffer = ByteBuffer::new();
        buffer.write_bulk(b"abc");
        buffer.write_str("render pass").unwrap();
        buffer.seek_to_beg();

        let mut raw = [0u8; 3];
        buffer.read_bulk(&mut raw).unwrap();
        assert_eq!(&raw, b"abc");
        assert_eq!(buffer.read_str().unwrap(), "render pass");
    }

    #[test]
    fn read_bytes_borrows_in_place() {
        let mut buffer = ByteBuffer::new();
        buffer.write(4u32);
        buffer.write_bulk(&[9, 8, 7, 6]);
        buffer.seek_to_beg();

        let len = buffer.read::<u32>().unwrap() as usize;
        assert_eq!(buffer.read_bytes(len).unwrap(), &[9, 8, 7, 6]);
    }

    // ── growth ───────────────────────────────────────────────────────────────

    #[test]
    fn capacity_doubles_until_write_fits() {
        let mut buffer = ByteBuffer::with_capacity(4);
        buffer.write_bulk(&[0; 3]);
        assert_eq!(buffer.capacity(), 4);

        buffer.write_bulk(&[0; 10]);
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.len(), 13);
    }

    #[test]
    fn zero_capacity_buffer_grows() {
        let mut buffer = ByteBuffer::with_capacity(0);
        buffer.write(1u8);
        assert_eq!(buffer.capacity(), 1);
        buffer.write(2u32);
        assert_eq!(buffer.capacity(), 8);
    }

    #[test]
    fn write_after_seek_overwrites_in_place() {
        let mut buffer = ByteBuffer::new();
        buffer.write(1u32);
        buffer.write(2u32);
        buffer.seek_to_beg();
        buffer.write(5u32);
        assert_eq!(buffer.len(), 8);

        buffer.seek_to_beg();
        assert_eq!(buffer.read::<u32>().unwrap(), 5);
        assert_eq!(buffer.read::<u32>().unwrap(), 2);
    }

    #[test]
    fn resize_shrinking_clamps_size_and_cursor() {
        let mut buffer = ByteBuffer::new();
        buffer.write_bulk(&[1; 32]);
        buffer.resize(8);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.position(), 8);
    }

    // ── bounds ───────────────────────────────────────────────────────────────

    #[test]
    fn read_past_written_size_fails() {
        let mut buffer = ByteBuffer::new();
        buffer.write(1u16);
        buffer.seek_to_beg();

        let err = buffer.read::<u32>().unwrap_err();
        assert_eq!(
            err,
            ByteBufferError::UnexpectedEnd {
                position: 0,
                requested: 4,
                size: 2
            }
        );
        // Failed reads leave the cursor untouched.
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn advance_is_bounds_checked() {
        let mut buffer = ByteBuffer::new();
        buffer.write_bulk(&[0; 6]);
        buffer.seek_to_beg();

        buffer.advance(4).unwrap();
        assert!(buffer.advance(3).is_err());
        buffer.advance(2).unwrap();
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn oversized_string_is_rejected() {
        let mut buffer = ByteBuffer::new();
        let long = "x".repeat(u16::MAX as usize + 1);
        assert_eq!(
            buffer.write_str(&long),
            Err(ByteBufferError::StringTooLong(u16::MAX as usize + 1))
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn fill_touches_only_written_bytes() {
        let mut buffer = ByteBuffer::new();
        buffer.write_bulk(&[1, 2, 3]);
        buffer.fill(0xAA);
        assert_eq!(buffer.as_slice(), &[0xAA; 3]);
    }

    // ── files ────────────────────────────────────────────────────────────────

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("nergal-byte-buffer-{}.bin", std::process::id()));

        let mut buffer = ByteBuffer::new();
        write_sample(&mut buffer);
        buffer.write_to_file(&path).unwrap();

        let mut loaded = ByteBuffer::read_from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.as_slice(), buffer.as_slice());
        assert_eq!(loaded.position(), 0);
        assert_eq!(loaded.read::<u32>().unwrap(), 7);
    }
}
