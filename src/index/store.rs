//! Index stores: the ordered record sequence the sorter permutes.
//!
//! `FileIndex` keeps records on disk in the fixed 12-byte layout so the
//! index never has to fit in memory; `MemoryIndex` holds them in a Vec for
//! tests and tools that already know the input is small.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::warn;

use super::record::{IndexRecord, RECORD_SIZE};

/// Records buffered by `FileIndex::push` before they hit the file.
const APPEND_BUF_RECORDS: usize = 4096;

pub trait IndexStore {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a record at the end of the index.
    fn push(&mut self, record: IndexRecord) -> io::Result<()>;

    fn get(&mut self, i: usize) -> io::Result<IndexRecord>;

    fn set(&mut self, i: usize, record: IndexRecord) -> io::Result<()>;

    /// Exchange two records. Only the index is touched.
    fn swap(&mut self, i: usize, j: usize) -> io::Result<()> {
        let a = self.get(i)?;
        let b = self.get(j)?;
        self.set(i, b)?;
        self.set(j, a)
    }

    /// Make every pushed record durable in the backing store.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn out_of_range(i: usize, len: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("index record {} out of range ({} records)", i, len),
    )
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryIndex {
    records: Vec<IndexRecord>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::default()
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }
}

impl From<Vec<IndexRecord>> for MemoryIndex {
    fn from(records: Vec<IndexRecord>) -> Self {
        MemoryIndex { records }
    }
}

impl IndexStore for MemoryIndex {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn push(&mut self, record: IndexRecord) -> io::Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn get(&mut self, i: usize) -> io::Result<IndexRecord> {
        self.records
            .get(i)
            .copied()
            .ok_or_else(|| out_of_range(i, self.records.len()))
    }

    fn set(&mut self, i: usize, record: IndexRecord) -> io::Result<()> {
        let len = self.records.len();
        let slot = self.records.get_mut(i).ok_or_else(|| out_of_range(i, len))?;
        *slot = record;
        Ok(())
    }

    fn swap(&mut self, i: usize, j: usize) -> io::Result<()> {
        let len = self.records.len();
        if i >= len || j >= len {
            return Err(out_of_range(i.max(j), len));
        }
        self.records.swap(i, j);
        Ok(())
    }
}

/// Removes the index file when dropped unless asked to keep it.
#[derive(Debug)]
struct IndexArtifact {
    path: PathBuf,
    keep: bool,
    removed: bool,
}

impl IndexArtifact {
    fn remove(&mut self) -> io::Result<()> {
        if self.keep || self.removed {
            return Ok(());
        }
        self.removed = true;
        fs::remove_file(&self.path)
    }
}

impl Drop for IndexArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!(
                "could not remove index file {}: {}",
                self.path.display(),
                crate::common::io_error_msg(&e)
            );
        }
    }
}

/// Disk-backed index in the 12-byte little-endian record layout.
///
/// Field order matters: `file` is declared before `artifact` so the handle
/// is closed before the file is unlinked.
#[derive(Debug)]
pub struct FileIndex {
    file: File,
    len: usize,
    /// Current file position, to skip redundant seeks on sequential access.
    cursor: u64,
    pending: Vec<u8>,
    rec_a: [u8; RECORD_SIZE],
    rec_b: [u8; RECORD_SIZE],
    artifact: IndexArtifact,
}

impl FileIndex {
    /// Create (or truncate) the index file at `path`.
    pub fn create(path: &Path, keep: bool) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(FileIndex {
            file,
            len: 0,
            cursor: 0,
            pending: Vec::with_capacity(APPEND_BUF_RECORDS * RECORD_SIZE),
            rec_a: [0u8; RECORD_SIZE],
            rec_b: [0u8; RECORD_SIZE],
            artifact: IndexArtifact {
                path: path.to_path_buf(),
                keep,
                removed: false,
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.artifact.path
    }

    /// Close the handle and delete the file (unless kept), reporting
    /// a failed delete instead of only logging it.
    pub fn close(self) -> io::Result<()> {
        let FileIndex {
            file, mut artifact, ..
        } = self;
        drop(file);
        artifact.remove()
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let end = ((self.len - self.pending.len() / RECORD_SIZE) * RECORD_SIZE) as u64;
        self.seek_to(end)?;
        self.file.write_all(&self.pending)?;
        self.cursor = end + self.pending.len() as u64;
        self.pending.clear();
        Ok(())
    }

    #[inline]
    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        if self.cursor != pos {
            self.file.seek(SeekFrom::Start(pos))?;
            self.cursor = pos;
        }
        Ok(())
    }

    #[inline]
    fn record_pos(&self, i: usize) -> io::Result<u64> {
        if i >= self.len {
            return Err(out_of_range(i, self.len));
        }
        Ok((i * RECORD_SIZE) as u64)
    }

    fn read_into_a(&mut self, i: usize) -> io::Result<()> {
        let pos = self.record_pos(i)?;
        self.seek_to(pos)?;
        self.file.read_exact(&mut self.rec_a)?;
        self.cursor += RECORD_SIZE as u64;
        Ok(())
    }

    fn write_at(&mut self, i: usize, bytes: [u8; RECORD_SIZE]) -> io::Result<()> {
        let pos = self.record_pos(i)?;
        self.seek_to(pos)?;
        self.file.write_all(&bytes)?;
        self.cursor += RECORD_SIZE as u64;
        Ok(())
    }
}

impl IndexStore for FileIndex {
    fn len(&self) -> usize {
        self.len
    }

    fn push(&mut self, record: IndexRecord) -> io::Result<()> {
        self.pending.extend_from_slice(&record.to_bytes());
        self.len += 1;
        if self.pending.len() >= APPEND_BUF_RECORDS * RECORD_SIZE {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn get(&mut self, i: usize) -> io::Result<IndexRecord> {
        self.flush_pending()?;
        self.read_into_a(i)?;
        Ok(IndexRecord::from_bytes(&self.rec_a))
    }

    fn set(&mut self, i: usize, record: IndexRecord) -> io::Result<()> {
        self.flush_pending()?;
        self.write_at(i, record.to_bytes())
    }

    /// Raw byte exchange of the two records, without decoding them.
    fn swap(&mut self, i: usize, j: usize) -> io::Result<()> {
        self.flush_pending()?;
        self.read_into_a(i)?;
        let pos_j = self.record_pos(j)?;
        self.seek_to(pos_j)?;
        self.file.read_exact(&mut self.rec_b)?;
        self.cursor += RECORD_SIZE as u64;
        let (a, b) = (self.rec_a, self.rec_b);
        self.write_at(i, b)?;
        self.write_at(j, a)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.file.flush()
    }
}
