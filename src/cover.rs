//! Cover resolver: finds the cover image and stores it beside the book.
//!
//! Every step is best-effort. A book without a recognisable cover, or whose
//! cover cannot be read or written, simply has none.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::package::PackageDocument;
use crate::zip::EpubArchive;

/// Extension used when the cover href carries none
pub const DEFAULT_COVER_EXTENSION: &str = "jpg";

/// Cover image pulled out of an archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverImage {
    /// Href relative to the package document
    pub href: String,
    /// File extension derived from the href
    pub extension: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

/// Href of the cover image, relative to the package document.
///
/// A captured value containing `.` is taken to be an href already; anything
/// else is looked up as a manifest id and kept as-is when the id is unknown.
pub fn resolve_cover_href(package: &PackageDocument) -> Option<String> {
    let reference = package.cover_ref.as_deref()?;
    if reference.contains('.') {
        return Some(reference.to_string());
    }
    Some(
        package
            .href(reference)
            .unwrap_or(reference)
            .to_string(),
    )
}

/// File extension of a cover href, `jpg` when it has none.
pub fn cover_extension(href: &str) -> String {
    let href = href.split(['#', '?']).next().unwrap_or(href);
    let file_name = href.rsplit('/').next().unwrap_or(href);
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => DEFAULT_COVER_EXTENSION.to_string(),
    }
}

/// Where the cover of the book stored at `book_path` lives:
/// `<dir>/<stem>_cover.<ext>`.
pub fn cover_destination(book_path: &Path, extension: &str) -> PathBuf {
    let stem = book_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}_cover.{}", stem, extension);
    match book_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Read the cover image out of the archive.
pub fn extract_cover<R: Read + Seek>(
    archive: &mut EpubArchive<R>,
    package: &PackageDocument,
) -> Option<CoverImage> {
    let href = resolve_cover_href(package)?;
    let path = package.resolve(&href);
    let Some(bytes) = archive.entry(&path) else {
        log::debug!("Cover '{}' not present in archive", path);
        return None;
    };
    Some(CoverImage {
        extension: cover_extension(&href),
        href,
        bytes,
    })
}

/// Write `cover` beside the book at `book_path`, returning the written path.
pub fn persist_cover(book_path: &Path, cover: &CoverImage) -> Option<PathBuf> {
    let destination = cover_destination(book_path, &cover.extension);
    match fs::write(&destination, &cover.bytes) {
        Ok(()) => Some(destination),
        Err(err) => {
            log::warn!(
                "Failed to write cover to {}: {}",
                destination.display(),
                err
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::parse_package_document;
    use crate::zip::build_zip;

    fn package(opf: &str) -> PackageDocument {
        parse_package_document(opf.as_bytes(), "OEBPS/content.opf")
    }

    #[test]
    fn test_resolve_cover_href_by_id() {
        let pkg = package(
            r#"<package><metadata><meta name="cover" content="img1"/></metadata>
<manifest><item id="img1" href="images/front.png"/></manifest></package>"#,
        );
        assert_eq!(resolve_cover_href(&pkg).as_deref(), Some("images/front.png"));
    }

    #[test]
    fn test_resolve_cover_href_dotted_value_is_href() {
        let pkg = package(
            r#"<package><metadata><meta name="cover" content="images/c.jpg"/></metadata></package>"#,
        );
        assert_eq!(resolve_cover_href(&pkg).as_deref(), Some("images/c.jpg"));
    }

    #[test]
    fn test_resolve_cover_href_unknown_id_kept() {
        let pkg = package(r#"<package><metadata><meta name="cover" content="nope"/></metadata></package>"#);
        assert_eq!(resolve_cover_href(&pkg).as_deref(), Some("nope"));
    }

    #[test]
    fn test_resolve_cover_href_none() {
        assert_eq!(resolve_cover_href(&package("<package/>")), None);
    }

    #[test]
    fn test_cover_extension() {
        assert_eq!(cover_extension("images/cover.png"), "png");
        assert_eq!(cover_extension("cover.jpeg#frag"), "jpeg");
        assert_eq!(cover_extension("images.v2/cover"), "jpg");
        assert_eq!(cover_extension("cover."), "jpg");
    }

    #[test]
    fn test_cover_destination() {
        let dest = cover_destination(Path::new("/data/books/book_1.epub"), "png");
        assert_eq!(dest, PathBuf::from("/data/books/book_1_cover.png"));
    }

    #[test]
    fn test_extract_and_persist_cover() {
        let bytes = build_zip(&[("OEBPS/images/front.png", b"\x89PNG fake", false)]);
        let mut archive = EpubArchive::from_bytes(bytes, None).unwrap();
        let pkg = package(
            r#"<package><manifest><item id="cover-art" href="images/front.png"/></manifest></package>"#,
        );
        let cover = extract_cover(&mut archive, &pkg).unwrap();
        assert_eq!(cover.extension, "png");

        let dir = tempfile::tempdir().unwrap();
        let book_path = dir.path().join("book_42.epub");
        let written = persist_cover(&book_path, &cover).unwrap();
        assert_eq!(written, dir.path().join("book_42_cover.png"));
        assert_eq!(std::fs::read(written).unwrap(), b"\x89PNG fake");
    }

    #[test]
    fn test_extract_cover_missing_entry() {
        let bytes = build_zip(&[("OEBPS/ch1.xhtml", b"<p/>", false)]);
        let mut archive = EpubArchive::from_bytes(bytes, None).unwrap();
        let pkg = package(
            r#"<package><manifest><item id="cover" href="gone.jpg"/></manifest></package>"#,
        );
        assert!(extract_cover(&mut archive, &pkg).is_none());
    }

    #[test]
    fn test_persist_cover_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let book_path = dir.path().join("missing").join("book.epub");
        let cover = CoverImage {
            href: "c.jpg".into(),
            extension: "jpg".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(persist_cover(&book_path, &cover).is_none());
    }
}
