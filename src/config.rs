//! Library and companion configuration.

use std::env;
use std::path::PathBuf;

/// Environment variable naming the library home directory
pub const HOME_ENV_VAR: &str = "THREADBOUND_HOME";

/// Directory name used when no home is configured
pub const DEFAULT_HOME_DIR: &str = ".threadbound";

/// Default cap on spoiler-safe context, in characters
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 30_000;

/// Where imported books and the library store live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Directory holding `<id>.epub` copies and their covers
    pub books_dir: PathBuf,
    /// JSON file holding book records, progress and companion history
    pub store_path: PathBuf,
}

impl LibraryConfig {
    /// Layout rooted at `home`: `home/books/` and `home/library.json`.
    pub fn with_home<P: Into<PathBuf>>(home: P) -> Self {
        let home = home.into();
        LibraryConfig {
            books_dir: home.join("books"),
            store_path: home.join("library.json"),
        }
    }

    /// Read the home directory from `THREADBOUND_HOME`, falling back to
    /// [`LibraryConfig::default`].
    pub fn from_env() -> Self {
        match env::var(HOME_ENV_VAR) {
            Ok(home) if !home.trim().is_empty() => Self::with_home(home),
            _ => Self::default(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::with_home(DEFAULT_HOME_DIR)
    }
}

/// Reading companion limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanionConfig {
    /// Longest context handed to the text generator, in characters
    pub max_context_chars: usize,
}

impl CompanionConfig {
    /// Set the context cap.
    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        CompanionConfig {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}
