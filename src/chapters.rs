//! Chapter materializer: spine order to chapter records and plain text.
//!
//! Chapters are the spine entries that resolve to a manifest item, ranked
//! from 0 in spine order. The same ranking is used when listing chapters at
//! import and when serving text later, so a chapter index means the same
//! document at both times.

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use crate::error::{EpubError, ZipError};
use crate::markup::{sniff_title, strip_markup};
use crate::package::PackageDocument;
use crate::zip::EpubArchive;

/// One readable unit of a book
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// `<manifest id>_<index>`
    pub id: String,
    /// Sniffed title, or `Chapter N` (1-based)
    pub title: String,
    /// Zero-based position among resolvable spine entries
    pub index: usize,
}

/// A spine entry that resolves to an archive path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpineTarget {
    /// Manifest id referenced by the spine
    pub idref: String,
    /// Archive path of the chapter document
    pub path: String,
}

/// Resolvable spine entries in reading order, paths resolved against the
/// package document's directory.
pub fn spine_targets(package: &PackageDocument) -> Vec<SpineTarget> {
    let mut targets = Vec::with_capacity(package.spine.len());
    for idref in &package.spine {
        match package.href(idref) {
            Some(href) => targets.push(SpineTarget {
                idref: idref.clone(),
                path: package.resolve(href),
            }),
            None => log::debug!("Spine idref '{}' has no manifest item; skipped", idref),
        }
    }
    targets
}

/// Fallback title for the chapter at zero-based `index`.
pub fn fallback_title(index: usize) -> String {
    format!("Chapter {}", index + 1)
}

/// Build one chapter record per resolvable spine entry.
///
/// Entries that cannot be read still produce a record with the fallback
/// title; the chapter list mirrors the spine, not archive health.
pub fn materialize_chapters<R: Read + Seek>(
    archive: &mut EpubArchive<R>,
    package: &PackageDocument,
) -> Vec<Chapter> {
    spine_targets(package)
        .into_iter()
        .enumerate()
        .map(|(index, target)| {
            let title = archive
                .entry_text(&target.path)
                .and_then(|markup| sniff_title(&markup))
                .unwrap_or_else(|| fallback_title(index));
            Chapter {
                id: format!("{}_{}", target.idref, index),
                title,
                index,
            }
        })
        .collect()
}

/// Plain text of the chapter at `index`.
///
/// Fails with [`EpubError::ChapterOutOfBounds`] past the last resolvable
/// spine entry and [`EpubError::EntryMissing`] when the chapter document is
/// not in the archive.
pub fn read_chapter_text<R: Read + Seek>(
    archive: &mut EpubArchive<R>,
    package: &PackageDocument,
    index: usize,
) -> Result<String, EpubError> {
    let mut targets = spine_targets(package);
    let chapter_count = targets.len();
    if index >= chapter_count {
        return Err(EpubError::ChapterOutOfBounds {
            index,
            chapter_count,
        });
    }
    let target = targets.swap_remove(index);
    let bytes = archive.read(&target.path).map_err(|err| match err {
        ZipError::FileNotFound => EpubError::EntryMissing { path: target.path },
        other => EpubError::Zip(other),
    })?;
    Ok(strip_markup(&String::from_utf8_lossy(&bytes)))
}

/// Plain text of the chapter at `index`, or `""` when it cannot be served.
pub fn chapter_text<R: Read + Seek>(
    archive: &mut EpubArchive<R>,
    package: &PackageDocument,
    index: usize,
) -> String {
    match read_chapter_text(archive, package, index) {
        Ok(text) => text,
        Err(err @ EpubError::ChapterOutOfBounds { .. }) => {
            log::debug!("{}", err);
            String::new()
        }
        Err(err) => {
            log::warn!("Chapter {} unavailable: {}", index, err);
            String::new()
        }
    }
}
