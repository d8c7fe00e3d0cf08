//! Reader-facing EPUB API.
//!
//! [`parse_metadata`] and [`get_chapter_content`] are what the rest of an
//! application calls: they never fail and degrade to a default record or an
//! empty string. [`EpubDocument`] is the fallible building block underneath
//! for callers that want to see the error.
//!
//! Nothing is cached. Every call reopens the archive and re-reads the
//! package document, so a book replaced on disk is never served stale.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chapters::{chapter_text, materialize_chapters, read_chapter_text, spine_targets, Chapter};
use crate::container::resolve_package_path;
use crate::cover::{extract_cover, persist_cover, CoverImage};
use crate::error::EpubError;
use crate::package::{parse_package_document, PackageDocument, UNKNOWN_AUTHOR, UNKNOWN_TITLE};
use crate::zip::{EpubArchive, ZipLimits};

/// Configuration for opening EPUB files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Optional ZIP safety limits used while reading archive entries.
    ///
    /// When `None`, no explicit entry-size cap is enforced.
    pub zip_limits: Option<ZipLimits>,
}

impl ReaderOptions {
    /// Options with no explicit limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set explicit ZIP limits.
    pub fn with_zip_limits(mut self, limits: ZipLimits) -> Self {
        self.zip_limits = Some(limits);
        self
    }
}

/// What an import learns about a book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    /// Book title
    pub title: String,
    /// Book author
    pub author: String,
    /// Where the cover was written, when the book has one
    pub cover_path: Option<PathBuf>,
    /// Chapters in reading order
    pub chapters: Vec<Chapter>,
}

impl BookMetadata {
    /// Record returned when a book cannot be read at all.
    pub fn unknown() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            cover_path: None,
            chapters: Vec::new(),
        }
    }
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Opened EPUB: archive handle plus parsed package document.
pub struct EpubDocument<R: Read + Seek> {
    archive: EpubArchive<R>,
    package: PackageDocument,
}

impl EpubDocument<File> {
    /// Open an EPUB from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EpubError> {
        Self::open_with_options(path, ReaderOptions::default())
    }

    /// Open an EPUB from disk with explicit options.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: ReaderOptions,
    ) -> Result<Self, EpubError> {
        let archive = EpubArchive::open_file(path, options.zip_limits)?;
        Ok(Self::from_archive(archive))
    }
}

impl EpubDocument<Cursor<Vec<u8>>> {
    /// Open an EPUB held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, EpubError> {
        Self::from_bytes_with_options(bytes, ReaderOptions::default())
    }

    /// Open an EPUB held in memory with explicit options.
    pub fn from_bytes_with_options(
        bytes: Vec<u8>,
        options: ReaderOptions,
    ) -> Result<Self, EpubError> {
        let archive = EpubArchive::from_bytes(bytes, options.zip_limits)?;
        Ok(Self::from_archive(archive))
    }
}

impl<R: Read + Seek> EpubDocument<R> {
    /// Open an EPUB from any `Read + Seek` source.
    pub fn from_reader(reader: R) -> Result<Self, EpubError> {
        Self::from_reader_with_options(reader, ReaderOptions::default())
    }

    /// Open an EPUB from any `Read + Seek` source with explicit options.
    pub fn from_reader_with_options(reader: R, options: ReaderOptions) -> Result<Self, EpubError> {
        let archive = EpubArchive::new_with_limits(reader, options.zip_limits)?;
        Ok(Self::from_archive(archive))
    }

    /// Locate and parse the package document of an opened archive.
    ///
    /// Only opening the zip container can fail; a missing or broken package
    /// document leaves an empty one with default title and author.
    pub fn from_archive(mut archive: EpubArchive<R>) -> Self {
        let package_path = resolve_package_path(&mut archive);
        let package = match archive.entry(&package_path) {
            Some(bytes) => parse_package_document(&bytes, &package_path),
            None => {
                log::debug!("Package document '{}' not found", package_path);
                PackageDocument::empty(&package_path)
            }
        };
        Self { archive, package }
    }

    /// Parsed package document.
    pub fn package(&self) -> &PackageDocument {
        &self.package
    }

    /// Book title.
    pub fn title(&self) -> &str {
        &self.package.title
    }

    /// Book author.
    pub fn author(&self) -> &str {
        &self.package.author
    }

    /// Number of chapters (resolvable spine entries).
    pub fn chapter_count(&self) -> usize {
        spine_targets(&self.package).len()
    }

    /// Chapter records with sniffed titles.
    pub fn chapters(&mut self) -> Vec<Chapter> {
        materialize_chapters(&mut self.archive, &self.package)
    }

    /// Plain text of one chapter.
    pub fn chapter_text(&mut self, index: usize) -> Result<String, EpubError> {
        read_chapter_text(&mut self.archive, &self.package, index)
    }

    /// Plain text of one chapter, `""` when it cannot be served.
    pub fn chapter_text_or_empty(&mut self, index: usize) -> String {
        chapter_text(&mut self.archive, &self.package, index)
    }

    /// Cover image bytes, when the book declares a readable one.
    pub fn cover_image(&mut self) -> Option<CoverImage> {
        extract_cover(&mut self.archive, &self.package)
    }

    /// Title, author and chapters. `cover_path` is left empty since nothing
    /// has been written yet.
    pub fn metadata(&mut self) -> BookMetadata {
        BookMetadata {
            title: self.package.title.clone(),
            author: self.package.author.clone(),
            cover_path: None,
            chapters: self.chapters(),
        }
    }
}

/// Read a book's metadata and write its cover beside it.
///
/// Never fails: an unreadable file yields [`BookMetadata::unknown`].
pub fn parse_metadata<P: AsRef<Path>>(path: P) -> BookMetadata {
    parse_metadata_with_options(path, ReaderOptions::default())
}

/// [`parse_metadata`] with explicit options.
pub fn parse_metadata_with_options<P: AsRef<Path>>(
    path: P,
    options: ReaderOptions,
) -> BookMetadata {
    let path = path.as_ref();
    let mut doc = match EpubDocument::open_with_options(path, options) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("Failed to open {}: {}", path.display(), err);
            return BookMetadata::unknown();
        }
    };

    let mut metadata = doc.metadata();
    metadata.cover_path = doc
        .cover_image()
        .and_then(|cover| persist_cover(path, &cover));
    log::debug!(
        "Parsed '{}' by {}: {} chapters, cover {}",
        metadata.title,
        metadata.author,
        metadata.chapters.len(),
        if metadata.cover_path.is_some() { "saved" } else { "absent" }
    );
    metadata
}

/// Plain text of chapter `chapter_index`, or `""` on any failure.
pub fn get_chapter_content<P: AsRef<Path>>(path: P, chapter_index: usize) -> String {
    get_chapter_content_with_options(path, chapter_index, ReaderOptions::default())
}

/// [`get_chapter_content`] with explicit options.
pub fn get_chapter_content_with_options<P: AsRef<Path>>(
    path: P,
    chapter_index: usize,
    options: ReaderOptions,
) -> String {
    let path = path.as_ref();
    match EpubDocument::open_with_options(path, options) {
        Ok(mut doc) => doc.chapter_text_or_empty(chapter_index),
        Err(err) => {
            log::warn!("Failed to open {}: {}", path.display(), err);
            String::new()
        }
    }
}
