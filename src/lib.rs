//! Sort text files of any size line by line in bounded memory.
//!
//! The file is indexed once into fixed 12-byte records (offset, length),
//! the index is comb-sorted in place with every comparison read back from
//! the untouched source file, and the sorted file is written by walking the
//! index. Memory use depends on the longest line, not on the file size.
//!
//! ```no_run
//! use bigsort_rs::encoding::{EncodingProfile, Newline};
//! use bigsort_rs::sort::sort_file;
//!
//! let sorted = sort_file("big.txt", &EncodingProfile::utf8(Newline::Lf))?;
//! println!("{}", sorted.display());
//! # Ok::<(), bigsort_rs::SortError>(())
//! ```
#![allow(clippy::len_without_is_empty, clippy::doc_lazy_continuation)]

/// Use mimalloc as the global allocator.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod check;
pub mod common;
pub mod encoding;
pub mod error;
pub mod generate;
pub mod index;
pub mod sort;

pub use error::{Result, SortError};
