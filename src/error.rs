//! Unified error types for threadbound
//!
//! Parsing never surfaces these to the reader-facing API; they exist for the
//! fallible building blocks and for the import/delete/companion boundary,
//! which is the only place errors are reported to callers.

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Error raised by the fallible EPUB building blocks
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EpubError {
    /// ZIP archive error
    Zip(ZipError),
    /// I/O error (description only, since `std::io::Error` is not `Clone`)
    Io(String),
    /// Chapter index requested is out of bounds
    ChapterOutOfBounds {
        /// Requested chapter index.
        index: usize,
        /// Number of resolvable chapters.
        chapter_count: usize,
    },
    /// A referenced entry is not present in the archive
    EntryMissing {
        /// Archive path that was looked up.
        path: String,
    },
}

impl fmt::Display for EpubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpubError::Zip(kind) => write!(f, "ZIP error: {}", kind),
            EpubError::Io(msg) => write!(f, "I/O error: {}", msg),
            EpubError::ChapterOutOfBounds {
                index,
                chapter_count,
            } => write!(
                f,
                "Chapter index {} out of bounds (chapter count: {})",
                index, chapter_count
            ),
            EpubError::EntryMissing { path } => {
                write!(f, "Archive entry '{}' not found", path)
            }
        }
    }
}

impl From<ZipError> for EpubError {
    fn from(err: ZipError) -> Self {
        EpubError::Zip(err)
    }
}

/// Archive-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZipErrorKind {
    /// No entry with the requested name
    FileNotFound,
    /// Signatures or offsets do not describe a ZIP archive
    InvalidFormat,
    /// Entry uses a method other than stored or deflate
    UnsupportedCompression,
    /// Deflate stream is corrupt or ends early
    DecompressError,
    /// Inflated bytes do not match the recorded CRC32
    CrcMismatch,
    /// Underlying reader failed or ended early
    IoError,
    /// Central directory declares more entries than are loaded
    CentralDirFull,
    /// Entry is larger than `ZipLimits::max_entry_size`
    FileTooLarge,
    /// Archive needs ZIP64 records
    UnsupportedZip64,
}

/// Archive error as returned by [`crate::zip::EpubArchive`].
pub type ZipError = ZipErrorKind;

impl fmt::Display for ZipErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ZipErrorKind::FileNotFound => "entry not found in archive",
            ZipErrorKind::InvalidFormat => "not a ZIP archive",
            ZipErrorKind::UnsupportedCompression => "unsupported compression method",
            ZipErrorKind::DecompressError => "corrupt deflate stream",
            ZipErrorKind::CrcMismatch => "CRC32 mismatch",
            ZipErrorKind::IoError => "archive read failed",
            ZipErrorKind::CentralDirFull => "too many central directory entries",
            ZipErrorKind::FileTooLarge => "entry exceeds size limit",
            ZipErrorKind::UnsupportedZip64 => "ZIP64 archives are not supported",
        };
        f.write_str(msg)
    }
}

/// Errors surfaced by the library boundary (import, delete, store persistence)
#[cfg(feature = "std")]
#[derive(Debug)]
#[non_exhaustive]
pub enum LibraryError {
    /// File system failure while copying, deleting or saving
    Io(std::io::Error),
    /// The store could not be encoded or decoded
    Serialize(serde_json::Error),
    /// No book with this id is recorded in the store
    BookNotFound(String),
}

#[cfg(feature = "std")]
impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "I/O error: {}", err),
            LibraryError::Serialize(err) => write!(f, "store encoding error: {}", err),
            LibraryError::BookNotFound(id) => write!(f, "book '{}' not found", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Io(err) => Some(err),
            LibraryError::Serialize(err) => Some(err),
            LibraryError::BookNotFound(_) => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

#[cfg(feature = "std")]
impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Serialize(err)
    }
}

/// Message shown to the reader when a companion request fails.
pub const COMPANION_FAILURE_MESSAGE: &str = "Failed to get AI response. Please try again.";

/// Errors surfaced by the reading companion
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompanionError {
    /// The text generator failed (quota, network, provider error)
    RequestFailed {
        /// Description of the underlying failure, for logs.
        cause: String,
    },
    /// No text generator is configured
    Unconfigured,
    /// The book is not in the library
    UnknownBook(String),
    /// The conversation could not be recorded
    History {
        /// Description of the store failure.
        cause: String,
    },
}

impl fmt::Display for CompanionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanionError::RequestFailed { .. } => f.write_str(COMPANION_FAILURE_MESSAGE),
            CompanionError::Unconfigured => f.write_str("reading companion is not configured"),
            CompanionError::UnknownBook(id) => write!(f, "book '{}' not found", id),
            CompanionError::History { cause } => {
                write!(f, "failed to record conversation: {}", cause)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EpubError {}

#[cfg(feature = "std")]
impl std::error::Error for ZipErrorKind {}

#[cfg(feature = "std")]
impl std::error::Error for CompanionError {}

#[cfg(feature = "std")]
impl From<LibraryError> for CompanionError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::BookNotFound(id) => CompanionError::UnknownBook(id),
            other => CompanionError::History {
                cause: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_epub_error_display() {
        let err = EpubError::EntryMissing {
            path: "OEBPS/ch1.xhtml".into(),
        };
        assert_eq!(
            format!("{}", err),
            "Archive entry 'OEBPS/ch1.xhtml' not found"
        );
    }

    #[test]
    fn test_zip_error_converts_into_epub_error() {
        let err: EpubError = ZipErrorKind::CrcMismatch.into();
        assert!(format!("{}", err).contains("ZIP error"));
    }

    #[test]
    fn test_companion_error_shows_retry_message() {
        let err = CompanionError::RequestFailed {
            cause: "quota exceeded".into(),
        };
        assert_eq!(format!("{}", err), COMPANION_FAILURE_MESSAGE);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_library_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = LibraryError::from(io);
        assert!(format!("{}", err).starts_with("I/O error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
