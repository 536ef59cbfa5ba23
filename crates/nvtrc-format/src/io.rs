use std::io::{self, Read, Write};

use crate::error::{NvtrcError, Result};

/// Upper bound on what an untrusted length field may pre-allocate before any bytes are read.
const PREALLOC_LIMIT: usize = 1 << 20;

pub trait WriteLeExt: Write {
    fn write_i32_le(&mut self, v: i32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }
}

impl<T: Write + ?Sized> WriteLeExt for T {}

pub trait ReadLeExt: Read {
    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_i32_le(&mut self) -> io::Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads at most `len` bytes, stopping early at end of stream.
    ///
    /// The returned buffer is shorter than `len` only when the stream ran dry. Allocation grows with
    /// the bytes actually present rather than with `len`.
    fn read_up_to(&mut self, len: u64) -> Result<Vec<u8>> {
        let initial = usize::try_from(len).unwrap_or(usize::MAX).min(PREALLOC_LIMIT);
        let mut buf = Vec::new();
        buf.try_reserve_exact(initial)
            .map_err(|_| NvtrcError::OutOfMemory { len: initial })?;
        (&mut *self).take(len).read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl<T: Read + ?Sized> ReadLeExt for T {}

/// Maps an end-of-stream failure onto a format-specific error; other I/O failures pass through.
pub(crate) fn eof_as(err: io::Error, on_eof: NvtrcError) -> NvtrcError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        on_eof
    } else {
        NvtrcError::Io(err)
    }
}

/// Little-endian field reader over one fixed-size record.
///
/// Callers hand it exactly as many bytes as the record layout declares, so every `take` stays in
/// bounds.
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    pub fn u16_le(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    pub fn u32_le(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    pub fn u64_le(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    pub fn i64_le(&mut self) -> i64 {
        i64::from_le_bytes(self.take())
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}
