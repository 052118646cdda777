//! Byte cursors used by the link record codec. Every multi-byte field is laid
//! out explicitly in little-endian order so the wire contract never depends on
//! in-memory struct layout.
use crate::error::{ByteReaderError, ByteWriterError};

/// Reader that extracts little-endian fields from a `&[u8]`
/// without extra allocation or copies.
pub struct ByteReader<'a> {
    /// Shared source buffer (typically a received link payload).
    buffer: &'a [u8],
    /// Number of bytes consumed from the beginning.
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of the provided buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Return a slice of `len` bytes from the current position.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ByteReaderError> {
        if len > self.remaining() {
            return Err(ByteReaderError::OutOfBounds {
                asked: len,
                available: self.remaining(),
            });
        }
        let slice = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ByteReaderError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ByteReaderError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ByteReaderError> {
        Ok(i8::from_le_bytes(self.read_array::<1>()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, ByteReaderError> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ByteReaderError> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// IEEE-754 single precision, little-endian.
    pub fn read_f32(&mut self) -> Result<f32, ByteReaderError> {
        Ok(f32::from_le_bytes(self.read_array::<4>()?))
    }
}
//==================================================================================BYTEWRITER

/// Writer laying little-endian fields into a `&mut [u8]`.
/// Used by the serialization layer to build link payloads field by field.
pub struct ByteWriter<'a> {
    /// Target buffer (typically the frame under construction).
    buffer: &'a mut [u8],
    /// Number of bytes written so far.
    cursor: usize,
}

impl<'a> ByteWriter<'a> {
    /// Create a writer positioned at the start of the buffer.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Expose the cursor position (useful to derive final length).
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Copy a byte slice into the buffer.
    pub fn write_slice(&mut self, slice: &[u8]) -> Result<(), ByteWriterError> {
        let available = self.buffer.len() - self.cursor;
        if slice.len() > available {
            return Err(ByteWriterError::OutOfBounds {
                asked: slice.len(),
                available,
            });
        }
        self.buffer[self.cursor..self.cursor + slice.len()].copy_from_slice(slice);
        self.cursor += slice.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), ByteWriterError> {
        self.write_slice(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), ByteWriterError> {
        self.write_slice(&value.to_le_bytes())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), ByteWriterError> {
        self.write_slice(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), ByteWriterError> {
        self.write_slice(&value.to_le_bytes())
    }

    /// IEEE-754 single precision, little-endian.
    pub fn write_f32(&mut self, value: f32) -> Result<(), ByteWriterError> {
        self.write_slice(&value.to_le_bytes())
    }
}
