//! Book import and removal.
//!
//! Importing copies the EPUB under the books directory with a generated id,
//! parses it once for title, author and chapters, stores its cover beside it
//! and records the result. Parsing cannot fail an import; only file-system
//! and store errors do.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::book::{get_chapter_content_with_options, parse_metadata_with_options, ReaderOptions};
use crate::config::LibraryConfig;
use crate::cover::cover_destination;
use crate::error::LibraryError;
use crate::store::{Book, FileType, LibraryStore, ProgressUpdate};

/// Extension given to stored book copies
pub const BOOK_EXTENSION: &str = "epub";

/// Cover extensions probed when a record has lost its cover path
const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Imported books on disk plus their records.
#[derive(Debug)]
pub struct Library {
    config: LibraryConfig,
    store: LibraryStore,
    options: ReaderOptions,
}

impl Library {
    /// Open the library described by `config`, loading its store.
    pub fn open(config: LibraryConfig) -> Result<Self, LibraryError> {
        let store = LibraryStore::load(config.store_path.clone())?;
        Ok(Library {
            config,
            store,
            options: ReaderOptions::default(),
        })
    }

    /// Use explicit reader options for every parse.
    pub fn with_reader_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Library layout.
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    /// Backing store, for progress and companion history updates.
    pub fn store_mut(&mut self) -> &mut LibraryStore {
        &mut self.store
    }

    /// All imported books.
    pub fn books(&self) -> &[Book] {
        self.store.books()
    }

    /// Import the EPUB at `source`.
    pub fn import_book<P: AsRef<Path>>(&mut self, source: P) -> Result<Book, LibraryError> {
        let source = source.as_ref();
        let result = self.import_inner(source);
        if let Err(err) = &result {
            log::error!("Import of {} failed: {}", source.display(), err);
        }
        result
    }

    fn import_inner(&mut self, source: &Path) -> Result<Book, LibraryError> {
        fs::create_dir_all(&self.config.books_dir)?;
        let (id, destination) = self.allocate_destination();
        fs::copy(source, &destination)?;

        let metadata = parse_metadata_with_options(&destination, self.options);
        let book = Book {
            id,
            title: metadata.title,
            author: metadata.author,
            cover_path: metadata.cover_path,
            file_path: destination,
            file_type: FileType::Epub,
            chapters: metadata.chapters,
            added_at: Utc::now(),
            last_read_at: None,
        };

        if let Err(err) = self.store.put_book(book.clone()) {
            remove_if_present(&book.file_path)?;
            if let Some(cover) = &book.cover_path {
                remove_if_present(cover)?;
            }
            return Err(err);
        }
        log::info!(
            "Imported '{}' by {} as {} ({} chapters)",
            book.title,
            book.author,
            book.id,
            book.chapters.len()
        );
        Ok(book)
    }

    /// Pick `book_<unix millis>`, bumping until neither a file nor a record
    /// already uses it.
    fn allocate_destination(&self) -> (String, PathBuf) {
        let mut stamp = Utc::now().timestamp_millis();
        loop {
            let id = format!("book_{}", stamp);
            let path = self
                .config
                .books_dir
                .join(format!("{}.{}", id, BOOK_EXTENSION));
            if !path.exists() && self.store.book(&id).is_none() {
                return (id, path);
            }
            stamp += 1;
        }
    }

    /// Remove a book, its stored file, its cover and everything recorded
    /// about it. Files already gone are not an error.
    ///
    /// Only paths taken from the book's record are touched; an id with no
    /// record just clears any progress or history left under it.
    pub fn delete_book(&mut self, id: &str) -> Result<(), LibraryError> {
        let result = self.delete_inner(id);
        if let Err(err) = &result {
            log::error!("Delete of {} failed: {}", id, err);
        }
        result
    }

    fn delete_inner(&mut self, id: &str) -> Result<(), LibraryError> {
        if let Some(book) = self.store.book(id) {
            let book_path = book.file_path.clone();
            if let Some(cover) = &book.cover_path {
                remove_if_present(cover)?;
            }
            remove_if_present(&book_path)?;
            for ext in COVER_EXTENSIONS {
                remove_if_present(&cover_destination(&book_path, ext))?;
            }
        } else {
            log::debug!("Delete of unknown book {}; no files touched", id);
        }
        self.store.remove_book(id)?;
        log::info!("Deleted book {}", id);
        Ok(())
    }

    /// Plain text of a chapter of an imported book.
    pub fn chapter_content(&self, id: &str, chapter_index: usize) -> Result<String, LibraryError> {
        let book = self
            .store
            .book(id)
            .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))?;
        Ok(get_chapter_content_with_options(
            &book.file_path,
            chapter_index,
            self.options,
        ))
    }

    /// Open a chapter for reading: fetch its text, record progress and make
    /// the book current.
    pub fn read_chapter(&mut self, id: &str, chapter_index: usize) -> Result<String, LibraryError> {
        let text = self.chapter_content(id, chapter_index)?;
        let chapter_count = self.store.book(id).map_or(0, |b| b.chapters.len());
        self.store
            .update_progress(id, ProgressUpdate::for_chapter(chapter_index, chapter_count))?;
        self.mark_read(id)?;
        Ok(text)
    }

    /// Stamp `last_read_at` and make the book current.
    pub fn mark_read(&mut self, id: &str) -> Result<(), LibraryError> {
        self.store.touch_book(id)?;
        self.store.set_current_book(Some(id))
    }
}

fn remove_if_present(path: &Path) -> Result<(), LibraryError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_library() -> (tempfile::TempDir, Library) {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(LibraryConfig::with_home(dir.path())).unwrap();
        (dir, library)
    }

    #[test]
    fn test_import_missing_source_fails() {
        let (dir, mut library) = temp_library();
        let err = library
            .import_book(dir.path().join("nope.epub"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Io(_)));
        assert!(library.books().is_empty());
    }

    #[test]
    fn test_import_non_epub_yields_unknown_record() {
        let (dir, mut library) = temp_library();
        let source = dir.path().join("notes.epub");
        fs::write(&source, b"plain text, not a zip").unwrap();

        let book = library.import_book(&source).unwrap();
        assert_eq!(book.title, "Unknown Title");
        assert_eq!(book.author, "Unknown Author");
        assert!(book.chapters.is_empty());
        assert!(book.cover_path.is_none());
        assert!(book.file_path.exists());
        assert!(book.id.starts_with("book_"));
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let (dir, mut library) = temp_library();
        let source = dir.path().join("a.epub");
        fs::write(&source, b"x").unwrap();
        let first = library.import_book(&source).unwrap();
        let second = library.import_book(&source).unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.file_path, second.file_path);
    }

    #[test]
    fn test_delete_unknown_book_is_ok() {
        let (_dir, mut library) = temp_library();
        library.delete_book("book_0").unwrap();
    }

    #[test]
    fn test_delete_unknown_id_touches_no_files() {
        let outer = tempfile::tempdir().unwrap();
        let home = outer.path().join("home");
        let mut library = Library::open(LibraryConfig::with_home(&home)).unwrap();
        fs::create_dir_all(&library.config().books_dir).unwrap();
        let victim = outer.path().join("victim.epub");
        let victim_cover = outer.path().join("victim_cover.jpg");
        fs::write(&victim, b"keep").unwrap();
        fs::write(&victim_cover, b"keep").unwrap();

        library.delete_book("../../victim").unwrap();
        assert!(victim.exists());
        assert!(victim_cover.exists());
    }

    #[test]
    fn test_delete_unknown_id_clears_leftover_state() {
        let (_dir, mut library) = temp_library();
        library
            .store_mut()
            .update_progress("book_9", ProgressUpdate::for_chapter(0, 2))
            .unwrap();
        library.delete_book("book_9").unwrap();
        assert!(library.store().progress("book_9").is_none());
    }

    #[test]
    fn test_failed_record_rolls_back_import() {
        let (dir, mut library) = temp_library();
        let source = dir.path().join("a.epub");
        fs::write(&source, b"x").unwrap();
        let mut tmp = library.config().store_path.clone().into_os_string();
        tmp.push(".tmp");
        fs::create_dir_all(PathBuf::from(tmp)).unwrap();

        assert!(library.import_book(&source).is_err());
        assert!(library.books().is_empty());
        let leftovers = fs::read_dir(&library.config().books_dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_chapter_content_unknown_book() {
        let (_dir, library) = temp_library();
        assert!(matches!(
            library.chapter_content("book_0", 0),
            Err(LibraryError::BookNotFound(_))
        ));
    }

    #[test]
    fn test_remove_if_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        remove_if_present(&path).unwrap();
        fs::write(&path, b"1").unwrap();
        remove_if_present(&path).unwrap();
        assert!(!path.exists());
    }
}
