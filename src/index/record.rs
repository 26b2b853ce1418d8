use crate::error::{Result, SortError};

/// Size of one on-disk index record: i64 offset + i32 length, little-endian.
pub const RECORD_SIZE: usize = 12;

/// Location of one line's content in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub offset: i64,
    pub length: i32,
}

impl IndexRecord {
    /// Build a record from unsigned stream positions, rejecting values that
    /// don't fit the fixed-width fields.
    pub fn new(offset: u64, length: u64) -> Result<Self> {
        let offset_i = i64::try_from(offset).map_err(|_| SortError::OffsetOverflow(offset))?;
        let length_i =
            i32::try_from(length).map_err(|_| SortError::LineTooLong { offset, length })?;
        Ok(IndexRecord {
            offset: offset_i,
            length: length_i,
        })
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    #[inline]
    pub fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut offset = [0u8; 8];
        let mut length = [0u8; 4];
        offset.copy_from_slice(&buf[..8]);
        length.copy_from_slice(&buf[8..]);
        IndexRecord {
            offset: i64::from_le_bytes(offset),
            length: i32::from_le_bytes(length),
        }
    }

    /// Offset and length as seek/read arguments.
    /// Negative fields can only come from a damaged index file.
    pub fn span(self) -> Result<(u64, usize)> {
        if self.offset < 0 || self.length < 0 {
            return Err(SortError::IndexCorrupt(format!(
                "negative field in record (offset {}, length {})",
                self.offset, self.length
            )));
        }
        Ok((self.offset as u64, self.length as usize))
    }
}
