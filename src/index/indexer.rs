//! Single pass over the source file producing one index record per line.
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use log::debug;

use super::record::IndexRecord;
use super::scan::NewlineMatcher;
use super::store::IndexStore;
use crate::common::io::read_full;
use crate::encoding::EncodingProfile;
use crate::error::{Result, SortError};

/// 256KB read buffer for the indexing scan.
const READ_BUF_SIZE: usize = 256 * 1024;

/// What the indexer learned about the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexSummary {
    /// Number of records emitted.
    pub lines: u64,
    /// Longest line content in bytes; sizes the sort scratch buffers.
    pub max_line_len: usize,
    /// Offset of the first content byte (BOM length when a BOM was skipped).
    pub content_start: u64,
}

/// Index every line of `source` into `store`.
///
/// The BOM of `profile`, if any, is skipped only on an exact byte match at
/// offset 0. Lines end at the profile's newline sequence; a trailing line
/// without terminator is indexed when nonempty, an empty trailing segment
/// is not.
pub fn build_index<R, S>(
    source: &mut R,
    profile: &EncodingProfile,
    store: &mut S,
) -> Result<IndexSummary>
where
    R: Read + Seek,
    S: IndexStore + ?Sized,
{
    let content_start = skip_bom(source, profile.bom())?;

    let mut matcher = NewlineMatcher::new(profile.newline());
    let nl_len = matcher.newline_len() as u64;
    let mut reader = BufReader::with_capacity(READ_BUF_SIZE, source);

    let mut summary = IndexSummary {
        content_start,
        ..IndexSummary::default()
    };
    // Absolute position of the first byte of the current chunk.
    let mut chunk_start = content_start;
    let mut line_start = content_start;

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        let n = chunk.len();
        matcher.scan(chunk, |end| {
            let end = chunk_start + end as u64;
            emit(&mut *store, &mut summary, line_start, end - nl_len - line_start)?;
            line_start = end;
            Ok::<(), SortError>(())
        })?;
        chunk_start += n as u64;
        reader.consume(n);
    }

    // Unterminated last line; a dangling partial terminator stays part of it.
    if chunk_start > line_start {
        emit(store, &mut summary, line_start, chunk_start - line_start)?;
    }

    store.flush()?;
    debug!(
        "indexed {} lines, longest {} bytes, content starts at {}",
        summary.lines, summary.max_line_len, summary.content_start
    );
    Ok(summary)
}

#[inline]
fn emit<S: IndexStore + ?Sized>(
    store: &mut S,
    summary: &mut IndexSummary,
    offset: u64,
    length: u64,
) -> Result<()> {
    let record = IndexRecord::new(offset, length)?;
    store.push(record)?;
    summary.lines += 1;
    summary.max_line_len = summary.max_line_len.max(record.length as usize);
    Ok(())
}

/// Returns the offset scanning should start from.
fn skip_bom<R: Read + Seek>(source: &mut R, bom: &[u8]) -> Result<u64> {
    source.seek(SeekFrom::Start(0))?;
    if bom.is_empty() {
        return Ok(0);
    }
    let mut head = [0u8; 4];
    let head = &mut head[..bom.len().min(4)];
    let n = read_full(source, head)?;
    if n == bom.len() && &head[..n] == bom {
        Ok(n as u64)
    } else {
        source.seek(SeekFrom::Start(0))?;
        Ok(0)
    }
}
