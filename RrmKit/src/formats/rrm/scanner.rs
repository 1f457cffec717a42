//! Bounds-checked little-endian reads over an RRM file buffer.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// An immutable byte buffer holding one RRM file.
///
/// All reads are little-endian and checked against the buffer length.
#[derive(Debug, Clone)]
pub struct RawBuffer {
    data: Vec<u8>,
}

impl RawBuffer {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Borrow `width` bytes at `offset`.
    ///
    /// # Errors
    /// `OutOfBounds` if the range does not lie inside the buffer.
    pub fn slice(&self, offset: u64, width: usize) -> Result<&[u8]> {
        let out_of_bounds = || Error::OutOfBounds {
            offset,
            width,
            len: self.data.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(width).ok_or_else(out_of_bounds)?;
        self.data.get(start..end).ok_or_else(out_of_bounds)
    }

    /// Whether `width` bytes at `offset` lie inside the buffer.
    #[must_use]
    pub fn contains(&self, offset: u64, width: u64) -> bool {
        offset
            .checked_add(width)
            .is_some_and(|end| end <= self.data.len() as u64)
    }

    /// # Errors
    /// `OutOfBounds` past the end of the buffer.
    pub fn read_u16(&self, offset: u64) -> Result<u16> {
        self.slice(offset, 2).map(LittleEndian::read_u16)
    }

    /// # Errors
    /// `OutOfBounds` past the end of the buffer.
    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        self.slice(offset, 4).map(LittleEndian::read_u32)
    }

    /// # Errors
    /// `OutOfBounds` past the end of the buffer.
    pub fn read_f32(&self, offset: u64) -> Result<f32> {
        self.slice(offset, 4).map(LittleEndian::read_f32)
    }

    /// Read `N` consecutive floats starting at `offset`.
    ///
    /// # Errors
    /// `OutOfBounds` if any of them lies past the end of the buffer.
    pub fn read_f32_array<const N: usize>(&self, offset: u64) -> Result<[f32; N]> {
        let bytes = self.slice(offset, N * 4)?;
        let mut out = [0.0f32; N];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }
}

impl From<Vec<u8>> for RawBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let mut data = vec![0x78, 0x56, 0x34, 0x12];
        data.extend_from_slice(&1.5f32.to_le_bytes());
        let buf = RawBuffer::new(data);

        assert_eq!(buf.read_u32(0).unwrap(), 0x12345678);
        assert_eq!(buf.read_u16(0).unwrap(), 0x5678);
        assert!((buf.read_f32(4).unwrap() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_read_past_end_is_out_of_bounds() {
        let buf = RawBuffer::new(vec![0; 6]);
        assert!(buf.read_u32(2).is_ok());
        match buf.read_u32(3) {
            Err(Error::OutOfBounds { offset, width, len }) => {
                assert_eq!((offset, width, len), (3, 4, 6));
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
        assert!(buf.read_f32(u64::MAX).is_err());
    }

    #[test]
    fn test_read_f32_array() {
        let data: Vec<u8> = [1.0f32, -2.0, 3.25]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let buf = RawBuffer::new(data);
        assert_eq!(buf.read_f32_array::<3>(0).unwrap(), [1.0, -2.0, 3.25]);
        assert!(buf.read_f32_array::<3>(4).is_err());
    }
}
