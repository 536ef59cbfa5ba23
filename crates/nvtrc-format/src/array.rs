//! Length-prefixed arrays of fixed-size records.
//!
//! Each array starts with an [`ArrayHeader`] recording the element count and the element size the
//! writer used. Records may only grow by appending fields: a reader whose native record is smaller
//! than the on-disk element keeps the prefix it understands and skips the rest of each element.
//! Elements smaller than the native record are rejected rather than upconverted.

use std::cmp::Ordering;
use std::io::{Read, Write};

use crate::error::{NvtrcError, Result};
use crate::io::{eof_as, ByteCursor, ReadLeExt, WriteLeExt};

/// A fixed-size on-disk record.
pub trait Record: Sized {
    /// Encoded size in bytes; `encode` must append exactly this many bytes.
    const SIZE: usize;

    fn encode(&self, out: &mut Vec<u8>);

    /// Decodes from a cursor positioned over exactly `SIZE` bytes.
    fn decode(cur: &mut ByteCursor<'_>) -> Self;
}

pub const ARRAY_HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayHeader {
    pub count: i32,
    pub element_size: i32,
}

impl ArrayHeader {
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let truncated = || NvtrcError::TruncatedOrCorruptHeader("array header truncated");
        let count = r.read_i32_le().map_err(|e| eof_as(e, truncated()))?;
        let element_size = r.read_i32_le().map_err(|e| eof_as(e, truncated()))?;
        Ok(Self {
            count,
            element_size,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_i32_le(self.count)?;
        w.write_i32_le(self.element_size)?;
        Ok(())
    }
}

pub fn write_array<W: Write, T: Record>(w: &mut W, items: &[T]) -> Result<()> {
    let count = i32::try_from(items.len())
        .map_err(|_| NvtrcError::CountOverflow { len: items.len() })?;
    ArrayHeader {
        count,
        element_size: T::SIZE as i32,
    }
    .write(w)?;

    let mut buf = Vec::with_capacity(T::SIZE);
    for item in items {
        buf.clear();
        item.encode(&mut buf);
        debug_assert_eq!(buf.len(), T::SIZE);
        w.write_bytes(&buf)?;
    }
    Ok(())
}

pub fn read_array<R: Read, T: Record>(r: &mut R) -> Result<Vec<T>> {
    let header = ArrayHeader::read(r)?;
    let count = usize::try_from(header.count)
        .map_err(|_| NvtrcError::TruncatedOrCorruptHeader("negative array count"))?;
    let on_disk = usize::try_from(header.element_size)
        .map_err(|_| NvtrcError::TruncatedOrCorruptHeader("negative element size"))?;
    let native = T::SIZE;

    tracing::debug!(count, on_disk, native, "reading record array");

    match on_disk.cmp(&native) {
        Ordering::Less => {
            tracing::warn!(
                on_disk,
                native,
                "record array was written by an older format; refusing to upconvert"
            );
            return Err(NvtrcError::IncompatibleOlderElementSize {
                on_disk: on_disk as u32,
                native: native as u32,
            });
        }
        Ordering::Greater => {
            tracing::warn!(
                on_disk,
                native,
                "record array was written by a newer format; skipping unknown trailing fields"
            );
        }
        Ordering::Equal => {}
    }

    // Both factors come from 31-bit fields, so the product cannot overflow a u64.
    let expected = count as u64 * on_disk as u64;
    let payload = r.read_up_to(expected)?;
    if (payload.len() as u64) < expected {
        return Err(NvtrcError::ArrayShortRead {
            expected,
            found: payload.len() as u64,
        });
    }

    let mut out = Vec::new();
    out.try_reserve_exact(count)
        .map_err(|_| NvtrcError::OutOfMemory {
            len: count.saturating_mul(native),
        })?;
    if count == 0 {
        return Ok(out);
    }

    // The stride is the on-disk element size; only the native prefix of each element is decoded.
    for element in payload.chunks_exact(on_disk) {
        out.push(T::decode(&mut ByteCursor::new(&element[..native])));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Pair(u32, u32);

    impl Record for Pair {
        const SIZE: usize = 8;

        fn encode(&self, out: &mut Vec<u8>) {
            out.extend_from_slice(&self.0.to_le_bytes());
            out.extend_from_slice(&self.1.to_le_bytes());
        }

        fn decode(cur: &mut ByteCursor<'_>) -> Self {
            Pair(cur.u32_le(), cur.u32_le())
        }
    }

    fn header(count: i32, element_size: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&element_size.to_le_bytes());
        out
    }

    #[test]
    fn write_emits_count_and_native_size() {
        let mut out = Vec::new();
        write_array(&mut out, &[Pair(1, 2), Pair(3, 4)]).unwrap();
        assert_eq!(&out[..ARRAY_HEADER_SIZE], &header(2, 8)[..]);
        assert_eq!(out.len(), ARRAY_HEADER_SIZE + 16);

        let read: Vec<Pair> = read_array(&mut Cursor::new(out)).unwrap();
        assert_eq!(read, vec![Pair(1, 2), Pair(3, 4)]);
    }

    #[test]
    fn wider_elements_are_strided_past() {
        let mut bytes = header(2, 12);
        for (a, b, extra) in [(1u32, 2u32, 0xDEAD_BEEFu32), (3, 4, 0xCAFE_F00D)] {
            bytes.extend_from_slice(&a.to_le_bytes());
            bytes.extend_from_slice(&b.to_le_bytes());
            bytes.extend_from_slice(&extra.to_le_bytes());
        }
        bytes.extend_from_slice(b"tail");

        let mut cursor = Cursor::new(bytes);
        let read: Vec<Pair> = read_array(&mut cursor).unwrap();
        assert_eq!(read, vec![Pair(1, 2), Pair(3, 4)]);
        assert_eq!(cursor.read_array::<4>().unwrap(), *b"tail");
    }

    #[test]
    fn narrower_elements_are_rejected() {
        let mut bytes = header(1, 4);
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let err = read_array::<_, Pair>(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            NvtrcError::IncompatibleOlderElementSize {
                on_disk: 4,
                native: 8
            }
        ));
    }

    #[test]
    fn short_payload_fails_whole_array() {
        let mut bytes = header(3, 8);
        bytes.extend_from_slice(&[0u8; 20]);
        let err = read_array::<_, Pair>(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            NvtrcError::ArrayShortRead {
                expected: 24,
                found: 20
            }
        ));
    }

    #[test]
    fn negative_count_is_corrupt_header() {
        let err = read_array::<_, Pair>(&mut Cursor::new(header(-1, 8))).unwrap_err();
        assert!(matches!(err, NvtrcError::TruncatedOrCorruptHeader(_)));
    }

    #[test]
    fn truncated_header_is_reported() {
        let err = read_array::<_, Pair>(&mut Cursor::new(vec![1u8, 0, 0])).unwrap_err();
        assert!(matches!(err, NvtrcError::TruncatedOrCorruptHeader(_)));
    }

    #[test]
    fn huge_count_does_not_preallocate() {
        let err = read_array::<_, Pair>(&mut Cursor::new(header(i32::MAX, 8))).unwrap_err();
        assert!(matches!(
            err,
            NvtrcError::ArrayShortRead { found: 0, .. }
        ));
    }
}
