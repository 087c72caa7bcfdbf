//! Error handling for VGM parsing and playback.

use thiserror::Error;

/// Convenient result alias for VGM operations.
pub type Result<T> = std::result::Result<T, VgmError>;

/// Errors that may occur while parsing or replaying a VGM image.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VgmError {
    /// File does not start with the `"Vgm "` identifier.
    #[error("not a VGM image (bad identifier)")]
    InvalidIdent,
    /// File is shorter than the fixed header.
    #[error("VGM image truncated ({size} bytes)")]
    TruncatedHeader {
        /// Actual image size.
        size: usize,
    },
    /// The mandatory `eof_offset` cross-check failed.
    #[error("eof_offset {stored} does not match image size {size}")]
    EofOffsetMismatch {
        /// `eof_offset` as stored plus the field base.
        stored: u32,
        /// Actual image size.
        size: usize,
    },
    /// The relative data offset points outside the image.
    #[error("vgm_data_offset points outside the image (0x{offset:08x})")]
    DataOffsetOutOfRange {
        /// Resolved absolute data offset.
        offset: usize,
    },
    /// A command byte the interpreter has no width for.
    #[error("unknown command 0x{command:02x} at offset 0x{offset:08x}")]
    UnknownCommand {
        /// The offending command byte.
        command: u8,
        /// Byte offset inside the image.
        offset: usize,
    },
    /// A command's operands run past the end of the image.
    #[error("unexpected end of stream at offset 0x{offset:08x}")]
    UnexpectedEof {
        /// Byte offset where operands were expected.
        offset: usize,
    },
}
