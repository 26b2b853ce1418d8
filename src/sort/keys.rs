//! Compare/Swap capability the sort algorithm is written against, and its
//! disk-backed implementation.
use std::cmp::Ordering;
use std::io::{Read, Seek, SeekFrom};

use crate::encoding::{DecodeScratch, EncodingProfile};
use crate::error::{Result, SortError};
use crate::index::{IndexRecord, IndexStore};

/// A sequence the sorter can only observe through pairwise comparison
/// and rearrange through swaps.
pub trait SortKeys {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compare(&mut self, i: usize, j: usize) -> Result<Ordering>;

    fn swap(&mut self, i: usize, j: usize) -> Result<()>;
}

/// In-memory keys, used to test and benchmark the algorithm in isolation.
impl<T: Ord> SortKeys for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn compare(&mut self, i: usize, j: usize) -> Result<Ordering> {
        Ok(self[i].cmp(&self[j]))
    }

    fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        <[T]>::swap(self, i, j);
        Ok(())
    }
}

/// Per-run scratch space: the only buffers whose size depends on the input,
/// both capped at the longest indexed line.
#[derive(Debug)]
pub struct LineScratch {
    max_line_len: usize,
    left: Vec<u8>,
    right: Vec<u8>,
    decode: DecodeScratch,
}

impl LineScratch {
    pub fn new(max_line_len: usize) -> Self {
        LineScratch {
            max_line_len,
            left: Vec::with_capacity(max_line_len),
            right: Vec::with_capacity(max_line_len),
            decode: DecodeScratch::default(),
        }
    }

    /// Bytes currently reserved by the line and decode buffers.
    pub fn reserved(&self) -> usize {
        self.left.capacity() + self.right.capacity() + self.decode.capacity()
    }

    /// Read the line `record` points at into the left buffer.
    pub fn read_line<R: Read + Seek>(
        &mut self,
        source: &mut R,
        record: IndexRecord,
    ) -> Result<&[u8]> {
        read_into(source, record, self.max_line_len, &mut self.left)?;
        Ok(&self.left)
    }

    /// Ordinal comparison of the lines behind two records.
    pub fn compare<R: Read + Seek>(
        &mut self,
        source: &mut R,
        profile: &EncodingProfile,
        a: IndexRecord,
        b: IndexRecord,
    ) -> Result<Ordering> {
        read_into(source, a, self.max_line_len, &mut self.left)?;
        read_into(source, b, self.max_line_len, &mut self.right)?;
        Ok(profile.compare(&self.left, &self.right, &mut self.decode))
    }
}

fn read_into<R: Read + Seek>(
    source: &mut R,
    record: IndexRecord,
    max_line_len: usize,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let (offset, len) = record.span()?;
    if len > max_line_len {
        return Err(SortError::IndexCorrupt(format!(
            "record at offset {} is {} bytes, longest indexed line is {}",
            offset, len, max_line_len
        )));
    }
    buf.clear();
    buf.resize(len, 0);
    if len > 0 {
        source.seek(SeekFrom::Start(offset))?;
        source.read_exact(buf)?;
    }
    Ok(())
}

/// Keys that live in an index store and dereference into the source file.
/// Compare costs two record reads plus two source seeks; swap touches
/// only the index.
pub struct DiskKeys<'a, S: ?Sized, R> {
    store: &'a mut S,
    source: &'a mut R,
    profile: &'a EncodingProfile,
    scratch: &'a mut LineScratch,
}

impl<'a, S, R> DiskKeys<'a, S, R>
where
    S: IndexStore + ?Sized,
    R: Read + Seek,
{
    pub fn new(
        store: &'a mut S,
        source: &'a mut R,
        profile: &'a EncodingProfile,
        scratch: &'a mut LineScratch,
    ) -> Self {
        DiskKeys {
            store,
            source,
            profile,
            scratch,
        }
    }
}

impl<S, R> SortKeys for DiskKeys<'_, S, R>
where
    S: IndexStore + ?Sized,
    R: Read + Seek,
{
    fn len(&self) -> usize {
        self.store.len()
    }

    fn compare(&mut self, i: usize, j: usize) -> Result<Ordering> {
        let a = self.store.get(i)?;
        let b = self.store.get(j)?;
        self.scratch.compare(&mut *self.source, self.profile, a, b)
    }

    fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        self.store.swap(i, j)?;
        Ok(())
    }
}
