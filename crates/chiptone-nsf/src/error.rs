//! Error handling for NSF parsing and playback.

use thiserror::Error;

/// Convenient result alias for NSF operations.
pub type Result<T> = std::result::Result<T, NsfError>;

/// Errors that may occur while parsing or starting an NSF image.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NsfError {
    /// File does not start with the `NESM` identifier.
    #[error("not an NSF image (bad identifier)")]
    InvalidIdent,
    /// File is shorter than the 128-byte header.
    #[error("NSF image truncated ({size} bytes)")]
    TruncatedHeader {
        /// Actual image size.
        size: usize,
    },
    /// The init routine faulted or overran its cycle budget.
    #[error("NSF init routine failed for track {track}")]
    InitFailed {
        /// The track that was being started.
        track: u32,
    },
}
