//! Post-hoc validation that a file's lines are in ordinal order.
//!
//! Lines are split exactly the way the indexer splits them, so a file the
//! engine produced validates against the profile it was sorted with.
use std::cmp::Ordering;
use std::io;
use std::path::Path;

use crate::common::io::map_file;
use crate::encoding::{DecodeScratch, EncodingProfile};
use crate::index::NewlineMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Every adjacent pair is in order.
    Sorted { lines: u64 },
    /// `line` (1-based) sorts before the line preceding it.
    Disorder { line: u64 },
}

impl CheckOutcome {
    pub fn is_sorted(&self) -> bool {
        matches!(self, CheckOutcome::Sorted { .. })
    }
}

/// Check in-memory data.
pub fn check_sorted_bytes<'a>(data: &'a [u8], profile: &EncodingProfile) -> CheckOutcome {
    let bom = profile.bom();
    let content = if !bom.is_empty() && data.starts_with(bom) {
        &data[bom.len()..]
    } else {
        data
    };

    let mut matcher = NewlineMatcher::new(profile.newline());
    let nl_len = matcher.newline_len();
    let mut scratch = DecodeScratch::default();
    let mut prev: Option<&'a [u8]> = None;
    let mut lines = 0u64;
    let mut line_start = 0usize;

    let mut visit = |line: &'a [u8]| -> Result<(), u64> {
        lines += 1;
        if let Some(p) = prev {
            if profile.compare(p, line, &mut scratch) == Ordering::Greater {
                return Err(lines);
            }
        }
        prev = Some(line);
        Ok(())
    };

    let scanned = matcher.scan(content, |end| {
        let line = &content[line_start..end - nl_len];
        line_start = end;
        visit(line)
    });
    let result = scanned.and_then(|()| {
        if line_start < content.len() {
            visit(&content[line_start..])
        } else {
            Ok(())
        }
    });

    match result {
        Ok(()) => CheckOutcome::Sorted { lines },
        Err(line) => CheckOutcome::Disorder { line },
    }
}

/// Check a file. Regular files are memory-mapped; when mapping fails or the
/// path is not a regular file the whole content is read into memory.
pub fn check_sorted_file(path: &Path, profile: &EncodingProfile) -> io::Result<CheckOutcome> {
    let data = map_file(path)?;
    Ok(check_sorted_bytes(&data, profile))
}
