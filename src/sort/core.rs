//! Sort engine: index, sort the index, write the sorted file.
//!
//! Memory stays bounded by the longest line regardless of file size:
//! - the index lives on disk next to the source, 12 bytes per line
//! - comb sort permutes index records in place, comparing lines by seeking
//!   into the untouched source file
//! - the writer streams lines back out in index order
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use super::comb::{CombStats, SHRINK_FACTOR, comb_sort};
use super::keys::{DiskKeys, LineScratch};
use super::materialize::materialize;
use crate::common::io::open_noatime;
use crate::encoding::EncodingProfile;
use crate::error::{Result, SortError};
use crate::index::{FileIndex, build_index};

/// Suffix appended to the source path to name the sorted file.
pub const OUTPUT_SUFFIX: &str = "_sorted.txt";

/// Suffix appended to the source path to name the transient index.
pub const INDEX_SUFFIX: &str = "_map.bin";

/// 64KB output buffer: large enough to batch small lines, small enough to
/// keep the memory bound independent of the input.
const OUTPUT_BUF_SIZE: usize = 64 * 1024;

/// Configuration for a sort run.
#[derive(Debug, Clone)]
pub struct SortConfig {
    pub output_suffix: String,
    pub index_suffix: String,
    pub shrink_factor: f64,
    /// Leave the index file on disk after the run, success or failure.
    pub keep_index: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            output_suffix: OUTPUT_SUFFIX.to_string(),
            index_suffix: INDEX_SUFFIX.to_string(),
            shrink_factor: SHRINK_FACTOR,
            keep_index: false,
        }
    }
}

impl SortConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.shrink_factor > 1.0 && self.shrink_factor.is_finite()) {
            return Err(SortError::InvalidConfig(format!(
                "shrink factor must be a finite number above 1, got {}",
                self.shrink_factor
            )));
        }
        if self.output_suffix.is_empty() || self.index_suffix.is_empty() {
            return Err(SortError::InvalidConfig(
                "output and index suffixes cannot be empty".to_string(),
            ));
        }
        if self.output_suffix == self.index_suffix {
            return Err(SortError::InvalidConfig(
                "output and index suffixes must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct SortReport {
    pub output: PathBuf,
    pub source_bytes: u64,
    pub lines: u64,
    pub max_line_len: usize,
    pub stats: CombStats,
}

/// `path` with `suffix` appended to its final component.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Sorts text files with a fixed encoding profile and configuration.
/// Each call to [`FileSorter::sort`] is an independent run with its own
/// handles and scratch buffers.
#[derive(Debug, Clone, Default)]
pub struct FileSorter {
    profile: EncodingProfile,
    config: SortConfig,
}

impl FileSorter {
    pub fn new(profile: EncodingProfile, config: SortConfig) -> Self {
        FileSorter { profile, config }
    }

    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    /// Sort `path` and return the path of the sorted file
    /// (`<absolute source path><output suffix>`).
    pub fn sort(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        Ok(self.sort_with_report(path)?.output)
    }

    pub fn sort_with_report(&self, path: impl AsRef<Path>) -> Result<SortReport> {
        let path = path.as_ref();
        if path.to_string_lossy().trim().is_empty() {
            return Err(SortError::InvalidPath(path.to_string_lossy().into_owned()));
        }
        self.config.validate()?;

        let full = std::path::absolute(path)?;
        let index_path = with_suffix(&full, &self.config.index_suffix);
        let output_path = with_suffix(&full, &self.config.output_suffix);

        // Both handles are released when this scope unwinds, on every path.
        // The index file is also unlinked then unless `keep_index` is set.
        let mut source = open_noatime(&full).map_err(|e| SortError::open(&full, e))?;
        let source_bytes = source.metadata()?.len();
        info!("source file is {} bytes", source_bytes);

        let mut index = FileIndex::create(&index_path, self.config.keep_index)
            .map_err(|e| SortError::open(&index_path, e))?;
        debug!("index file {}", index.path().display());

        let start = Instant::now();
        info!("building index...");
        let summary = build_index(&mut source, &self.profile, &mut index)?;
        debug!(
            "index: {} lines, longest {} bytes, {}ms",
            summary.lines,
            summary.max_line_len,
            start.elapsed().as_millis()
        );

        let mut scratch = LineScratch::new(summary.max_line_len);
        debug!("line scratch: {} bytes", scratch.reserved());

        let start = Instant::now();
        info!("sorting index...");
        let stats = {
            let mut keys = DiskKeys::new(&mut index, &mut source, &self.profile, &mut scratch);
            comb_sort(&mut keys, self.config.shrink_factor)?
        };
        debug!(
            "sort: {} passes, {} compares, {} swaps, {}ms",
            stats.passes,
            stats.compares,
            stats.swaps,
            start.elapsed().as_millis()
        );

        let start = Instant::now();
        info!("writing sorted file...");
        let output = File::create(&output_path).map_err(|e| SortError::open(&output_path, e))?;
        let mut writer = BufWriter::with_capacity(OUTPUT_BUF_SIZE, output);
        let lines = materialize(
            &mut index,
            &mut source,
            &self.profile,
            &mut scratch,
            &mut writer,
        )?;
        drop(writer);
        debug!("write: {} lines, {}ms", lines, start.elapsed().as_millis());

        drop(source);
        index.close()?;

        Ok(SortReport {
            output: output_path,
            source_bytes,
            lines,
            max_line_len: summary.max_line_len,
            stats,
        })
    }
}

/// Sort `path` with the default configuration.
pub fn sort_file(path: impl AsRef<Path>, profile: &EncodingProfile) -> Result<PathBuf> {
    FileSorter::new(profile.clone(), SortConfig::default()).sort(path)
}
