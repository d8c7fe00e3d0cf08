//! threadbound -- EPUB structure extraction and chapter text for readers
//!
//! Opens an EPUB container, follows `META-INF/container.xml` to the package
//! document, and exposes the three things an ebook reader needs: title and
//! author, an ordered chapter list, and the plain text of any chapter. A small
//! library layer keeps imported books, reading progress and the reading
//! companion's conversation on disk.
//!
//! # Features
//!
//! - `std` (default) -- ZIP reader, file I/O, library store and companion
//! - `async` -- tokio-backed file loading
//! - `cli` -- the `threadbound` command-line tool
//!
//! # Failure model
//!
//! Reader-facing entrypoints ([`parse_metadata`], [`get_chapter_content`])
//! never fail: unreadable input yields "Unknown Title"/"Unknown Author", an
//! empty chapter list or empty text. Only import, delete and companion
//! requests report errors to the caller.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::redundant_clone)]
#![warn(
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

extern crate alloc;

pub mod container;
pub mod error;
pub mod markup;
pub mod package;
mod xml;

#[cfg(feature = "std")]
pub mod book;

#[cfg(feature = "std")]
pub mod chapters;

#[cfg(feature = "std")]
pub mod companion;

#[cfg(feature = "std")]
pub mod config;

#[cfg(feature = "std")]
pub mod cover;

#[cfg(feature = "std")]
pub mod library;

#[cfg(feature = "std")]
pub mod prompts;

#[cfg(feature = "std")]
pub mod store;

#[cfg(feature = "async")]
pub mod async_api;

#[cfg(feature = "std")]
pub mod zip;

// Re-export key types for convenience
#[cfg(feature = "async")]
pub use async_api::{
    get_chapter_content_async, open_epub_file_async, open_epub_file_async_with_options,
    parse_metadata_async,
};
#[cfg(feature = "std")]
pub use book::{
    get_chapter_content, get_chapter_content_with_options, parse_metadata,
    parse_metadata_with_options, BookMetadata, EpubDocument, ReaderOptions,
};
#[cfg(feature = "std")]
pub use chapters::Chapter;
#[cfg(feature = "std")]
pub use companion::{
    build_spoiler_safe_context, CompanionRequest, GenerationError, GenerationRequest,
    ReadingCompanion, TextGenerator,
};
#[cfg(feature = "std")]
pub use config::{CompanionConfig, LibraryConfig};
pub use container::{parse_container_xml, DEFAULT_PACKAGE_PATH};
#[cfg(feature = "std")]
pub use error::LibraryError;
pub use error::{CompanionError, EpubError, ZipError, ZipErrorKind};
#[cfg(feature = "std")]
pub use library::Library;
pub use package::{parse_package_document, PackageDocument, UNKNOWN_AUTHOR, UNKNOWN_TITLE};
#[cfg(feature = "std")]
pub use store::{Book, CompanionMessage, LibraryStore, MessageKind, ReadingProgress, Role};
#[cfg(feature = "std")]
pub use zip::{EpubArchive, ZipLimits};
