use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NvtrcError>;

#[derive(Debug, Error)]
pub enum NvtrcError {
    #[error("failed to open {}: {source}", path.display())]
    StreamOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("truncated or corrupt header: {0}")]
    TruncatedOrCorruptHeader(&'static str),

    #[error("invalid capture magic {found:02x?}")]
    BadMagicTag { found: [u8; 8] },

    #[error("array payload truncated (expected {expected} bytes, found {found} bytes)")]
    ArrayShortRead { expected: u64, found: u64 },

    /// The file predates fields this reader expects. Upconversion is not attempted.
    #[error(
        "on-disk element size {on_disk} bytes is smaller than the native record size {native} bytes"
    )]
    IncompatibleOlderElementSize { on_disk: u32, native: u32 },

    #[error("out of memory allocating {len} bytes")]
    OutOfMemory { len: usize },

    #[error("failed to create {}: {source}", path.display())]
    StreamCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("array of {len} elements does not fit in a 32-bit count")]
    CountOverflow { len: usize },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
