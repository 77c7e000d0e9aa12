//! Error types for RGSSAD archive operations.
//!
//! This module provides the [`Error`] enum covering every failure mode of
//! the library, along with the [`Result<T>`] alias used throughout.
//!
//! Parse errors are fatal to [`Archive::open`]: the archive is either fully
//! indexed or not opened at all. Errors on an open stream leave its position
//! indeterminate; callers should seek before the next read.
//!
//! [`Archive::open`]: crate::Archive::open

use std::io;

use crate::tree::InodeId;

/// The main error type for RGSSAD archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Format | [`UnsupportedFormat`][Self::UnsupportedFormat], [`Truncated`][Self::Truncated], [`InvalidName`][Self::InvalidName], [`InvalidPath`][Self::InvalidPath] | Invalid archive data |
/// | Lookup | [`NotFound`][Self::NotFound], [`NotAFile`][Self::NotAFile], [`NotADirectory`][Self::NotADirectory] | Bad inode or type mismatch |
/// | Arguments | [`NegativeSeek`][Self::NegativeSeek] | Seek resolving before byte 0 |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading the archive file.
    ///
    /// This wraps [`std::io::Error`] and is propagated verbatim from the
    /// underlying file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not an RGSSAD or Fux2Pack container.
    ///
    /// Returned when the 8-byte header does not carry a known magic, or
    /// carries an `RGSSAD\0` magic with an unknown version byte. The string
    /// describes what was found.
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    /// The archive ended before a complete record could be read, or a
    /// declared payload extends past the end of the file.
    ///
    /// The offset is the absolute byte position in the archive file where
    /// the inconsistency was detected.
    #[error("truncated archive at offset {offset:#x}: {reason}")]
    Truncated {
        /// Absolute byte offset where the truncation was detected.
        offset: u64,
        /// A description of the missing data.
        reason: String,
    },

    /// An entry name in the archive metadata is not valid UTF-8.
    ///
    /// Archives produced by some legacy tools use Shift-JIS names; those are
    /// rejected rather than silently mangled.
    #[error("entry name is not valid UTF-8: {0}")]
    InvalidName(std::string::FromUtf8Error),

    /// An entry path in the archive metadata is unusable: it normalizes to
    /// nothing, or its `..` components would climb above the archive root.
    #[error("invalid entry path: {0:?}")]
    InvalidPath(String),

    /// No inode with the given id exists in this archive.
    #[error("no inode with id {inode}")]
    NotFound {
        /// The inode id that was out of range.
        inode: InodeId,
    },

    /// A file operation was attempted on a directory inode.
    #[error("inode {inode} is not a file")]
    NotAFile {
        /// The offending inode id.
        inode: InodeId,
    },

    /// A directory operation was attempted on a file inode.
    #[error("inode {inode} is not a directory")]
    NotADirectory {
        /// The offending inode id.
        inode: InodeId,
    },

    /// A seek resolved to a position before the start of the entry.
    #[error("seek to negative position {position}")]
    NegativeSeek {
        /// The (negative) virtual position the seek resolved to.
        position: i64,
    },
}

impl Error {
    /// Creates a [`Truncated`][Self::Truncated] error.
    pub(crate) fn truncated(offset: u64, reason: impl Into<String>) -> Self {
        Error::Truncated {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error indicates a missing inode or name.
    ///
    /// A FUSE adapter maps these to `ENOENT`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns `true` if this error indicates damaged or malformed archive
    /// data rather than caller misuse.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::Truncated { .. } | Error::InvalidName(_) | Error::InvalidPath(_)
        )
    }

    /// Returns the inode id associated with this error, if any.
    pub fn inode(&self) -> Option<InodeId> {
        match self {
            Error::NotFound { inode }
            | Error::NotAFile { inode }
            | Error::NotADirectory { inode } => Some(*inode),
            _ => None,
        }
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
