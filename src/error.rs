use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a sort run.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("invalid path: '{0}' cannot be empty or whitespace")]
    InvalidPath(String),

    #[error("cannot open '{}': {}", .path.display(), crate::common::io_error_msg(.source))]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line at offset {offset} is {length} bytes long, longer than an index record can describe")]
    LineTooLong { offset: u64, length: u64 },

    #[error("byte offset {0} does not fit in an index record")]
    OffsetOverflow(u64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("{}", crate::common::io_error_msg(.0))]
    Io(#[from] io::Error),
}

impl SortError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SortError::Open {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SortError>;
