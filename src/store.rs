//! Persisted library store.
//!
//! One JSON document holds every book record, per-book reading progress, the
//! current book and the companion conversation per book. The store is loaded
//! once and written back after every mutation; a write goes to a sibling
//! temporary file first and is renamed over the old document. A mutation is
//! applied to a copy of the records and only becomes visible once the copy
//! is on disk, so a failed write leaves memory and file in agreement.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chapters::Chapter;
use crate::error::LibraryError;

/// Format of a stored book file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// EPUB 2 or 3
    #[default]
    Epub,
}

/// A book in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Generated identifier (`book_<unix millis>`)
    pub id: String,
    /// Title from the package document
    pub title: String,
    /// Author from the package document
    pub author: String,
    /// Cover stored beside the book file, if any
    pub cover_path: Option<PathBuf>,
    /// Stored copy of the book
    pub file_path: PathBuf,
    /// Always `epub`
    #[serde(default)]
    pub file_type: FileType,
    /// Chapters in reading order
    pub chapters: Vec<Chapter>,
    /// When the book was imported
    pub added_at: DateTime<Utc>,
    /// When the book was last opened
    pub last_read_at: Option<DateTime<Utc>>,
}

/// Where the reader is in a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    /// Book this progress belongs to
    pub book_id: String,
    /// Zero-based index of the open chapter
    pub current_chapter_index: usize,
    /// One-based page (one page per chapter)
    pub current_page: usize,
    /// Page count
    pub total_pages: usize,
    /// Share of the book read, 0 to 100
    pub percentage: f32,
    /// When this record last changed
    pub last_updated: DateTime<Utc>,
}

impl ReadingProgress {
    fn start(book_id: &str) -> Self {
        ReadingProgress {
            book_id: book_id.to_string(),
            current_chapter_index: 0,
            current_page: 0,
            total_pages: 0,
            percentage: 0.0,
            last_updated: Utc::now(),
        }
    }
}

/// Partial progress update; `None` fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressUpdate {
    /// New chapter index
    pub current_chapter_index: Option<usize>,
    /// New page
    pub current_page: Option<usize>,
    /// New page count
    pub total_pages: Option<usize>,
    /// New percentage
    pub percentage: Option<f32>,
}

impl ProgressUpdate {
    /// Progress after opening chapter `index` of a book with
    /// `chapter_count` chapters, one page per chapter.
    pub fn for_chapter(index: usize, chapter_count: usize) -> Self {
        let percentage = if chapter_count == 0 {
            0.0
        } else {
            ((index + 1) as f32 / chapter_count as f32 * 100.0).min(100.0)
        };
        ProgressUpdate {
            current_chapter_index: Some(index),
            current_page: Some(index + 1),
            total_pages: Some(chapter_count),
            percentage: Some(percentage),
        }
    }

    fn apply(self, progress: &mut ReadingProgress) {
        if let Some(index) = self.current_chapter_index {
            progress.current_chapter_index = index;
        }
        if let Some(page) = self.current_page {
            progress.current_page = page;
        }
        if let Some(total) = self.total_pages {
            progress.total_pages = total;
        }
        if let Some(percentage) = self.percentage {
            progress.percentage = percentage;
        }
        progress.last_updated = Utc::now();
    }
}

/// Who wrote a companion message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The reader
    User,
    /// The text generator
    Assistant,
}

/// What a companion exchange was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Story-so-far summary
    Summary,
    /// Returning-reader recap
    Recap,
    /// Character guide
    Character,
    /// Passage explanation
    Explain,
    /// Free-form question
    Chat,
}

/// One turn of the companion conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionMessage {
    /// Random v4 UUID
    pub id: String,
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
    /// Request kind, serialized as `type`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
}

impl CompanionMessage {
    /// New message stamped now with a fresh id.
    pub fn new(role: Role, content: impl Into<String>, kind: Option<MessageKind>) -> Self {
        CompanionMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoreData {
    books: Vec<Book>,
    progress: BTreeMap<String, ReadingProgress>,
    current_book_id: Option<String>,
    companion_history: BTreeMap<String, Vec<CompanionMessage>>,
}

/// Library records backed by a JSON file.
#[derive(Debug)]
pub struct LibraryStore {
    path: PathBuf,
    data: StoreData,
}

impl LibraryStore {
    /// Load the store at `path`; a missing file is an empty library.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self, LibraryError> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No library store at {}; starting empty", path.display());
                StoreData::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(LibraryStore { path, data })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the store to disk.
    pub fn save(&self) -> Result<(), LibraryError> {
        write_atomically(&self.path, &self.data)
    }

    /// Apply `change` to a copy of the records, persist the copy, then adopt
    /// it. On any error the in-memory records are left untouched.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut StoreData) -> Result<T, LibraryError>,
    ) -> Result<T, LibraryError> {
        let mut next = self.data.clone();
        let out = change(&mut next)?;
        write_atomically(&self.path, &next)?;
        self.data = next;
        Ok(out)
    }

    /// All books in import order.
    pub fn books(&self) -> &[Book] {
        &self.data.books
    }

    /// Book by id.
    pub fn book(&self, id: &str) -> Option<&Book> {
        self.data.books.iter().find(|b| b.id == id)
    }

    /// Insert a book, replacing any record with the same id.
    pub fn put_book(&mut self, book: Book) -> Result<(), LibraryError> {
        self.commit(|data| {
            match data.books.iter_mut().find(|b| b.id == book.id) {
                Some(existing) => *existing = book,
                None => data.books.push(book),
            }
            Ok(())
        })
    }

    /// Remove a book with its progress and companion history.
    pub fn remove_book(&mut self, id: &str) -> Result<Option<Book>, LibraryError> {
        self.commit(|data| {
            let position = data.books.iter().position(|b| b.id == id);
            let removed = position.map(|pos| data.books.remove(pos));
            data.progress.remove(id);
            data.companion_history.remove(id);
            if data.current_book_id.as_deref() == Some(id) {
                data.current_book_id = None;
            }
            Ok(removed)
        })
    }

    /// Reading progress for a book.
    pub fn progress(&self, book_id: &str) -> Option<&ReadingProgress> {
        self.data.progress.get(book_id)
    }

    /// Merge `update` into the stored progress and stamp `last_updated`.
    pub fn update_progress(
        &mut self,
        book_id: &str,
        update: ProgressUpdate,
    ) -> Result<ReadingProgress, LibraryError> {
        self.commit(|data| {
            let progress = data
                .progress
                .entry(book_id.to_string())
                .or_insert_with(|| ReadingProgress::start(book_id));
            update.apply(progress);
            Ok(progress.clone())
        })
    }

    /// Record which book is open, if any.
    pub fn set_current_book(&mut self, book_id: Option<&str>) -> Result<(), LibraryError> {
        self.commit(|data| {
            data.current_book_id = book_id.map(str::to_string);
            Ok(())
        })
    }

    /// The open book, if any.
    pub fn current_book_id(&self) -> Option<&str> {
        self.data.current_book_id.as_deref()
    }

    /// Stamp `last_read_at` on a book.
    pub fn touch_book(&mut self, book_id: &str) -> Result<(), LibraryError> {
        self.commit(|data| {
            let book = data
                .books
                .iter_mut()
                .find(|b| b.id == book_id)
                .ok_or_else(|| LibraryError::BookNotFound(book_id.to_string()))?;
            book.last_read_at = Some(Utc::now());
            Ok(())
        })
    }

    /// Companion conversation for a book, oldest first.
    pub fn history(&self, book_id: &str) -> &[CompanionMessage] {
        self.data
            .companion_history
            .get(book_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a message to a book's conversation.
    pub fn add_message(
        &mut self,
        book_id: &str,
        message: CompanionMessage,
    ) -> Result<(), LibraryError> {
        self.commit(|data| {
            data.companion_history
                .entry(book_id.to_string())
                .or_default()
                .push(message);
            Ok(())
        })
    }

    /// Forget a book's conversation.
    pub fn clear_history(&mut self, book_id: &str) -> Result<(), LibraryError> {
        self.commit(|data| {
            data.companion_history
                .insert(book_id.to_string(), Vec::new());
            Ok(())
        })
    }
}

fn write_atomically(path: &Path, data: &StoreData) -> Result<(), LibraryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(data)?;
    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
