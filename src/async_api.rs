//! Optional async helpers.
//!
//! This module is available with the `async` feature. File reads go through
//! `tokio::fs`; parsing itself stays synchronous on the calling task.

use std::io::Cursor;
use std::path::Path;

use crate::book::{BookMetadata, EpubDocument, ReaderOptions};
use crate::cover::cover_destination;
use crate::error::EpubError;

/// Read an EPUB file asynchronously and open it as an `EpubDocument`.
///
/// This helper reads the whole file into memory.
pub async fn open_epub_file_async<P: AsRef<Path>>(
    path: P,
) -> Result<EpubDocument<Cursor<Vec<u8>>>, EpubError> {
    open_epub_file_async_with_options(path, ReaderOptions::default()).await
}

/// Read an EPUB file asynchronously and open it with options.
pub async fn open_epub_file_async_with_options<P: AsRef<Path>>(
    path: P,
    options: ReaderOptions,
) -> Result<EpubDocument<Cursor<Vec<u8>>>, EpubError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EpubError::Io(e.to_string()))?;
    EpubDocument::from_bytes_with_options(bytes, options)
}

/// Async [`parse_metadata`](crate::book::parse_metadata).
pub async fn parse_metadata_async<P: AsRef<Path>>(path: P) -> BookMetadata {
    let path = path.as_ref();
    let mut doc = match open_epub_file_async(path).await {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("Failed to open {}: {}", path.display(), err);
            return BookMetadata::unknown();
        }
    };

    let mut metadata = doc.metadata();
    if let Some(cover) = doc.cover_image() {
        let destination = cover_destination(path, &cover.extension);
        metadata.cover_path = match tokio::fs::write(&destination, &cover.bytes).await {
            Ok(()) => Some(destination),
            Err(err) => {
                log::warn!("Failed to write cover to {}: {}", destination.display(), err);
                None
            }
        };
    }
    metadata
}

/// Async [`get_chapter_content`](crate::book::get_chapter_content).
pub async fn get_chapter_content_async<P: AsRef<Path>>(path: P, chapter_index: usize) -> String {
    let path = path.as_ref();
    match open_epub_file_async(path).await {
        Ok(mut doc) => doc.chapter_text_or_empty(chapter_index),
        Err(err) => {
            log::warn!("Failed to open {}: {}", path.display(), err);
            String::new()
        }
    }
}
