//! Spoiler-safe reading companion.
//!
//! The companion only ever shows the text generator the chapters the reader
//! has reached. Context is rebuilt from the book file on every request, so
//! it always matches the stored reading position.
//!
//! The generator itself sits behind [`TextGenerator`]; this crate ships no
//! client for any provider.

use std::fmt;
use std::path::Path;

use crate::book::{EpubDocument, ReaderOptions};
use crate::config::CompanionConfig;
use crate::error::{CompanionError, EpubError};
use crate::prompts::{
    CHARACTER_PROMPT, EXPLAIN_PROMPT, RECAP_PROMPT, SUMMARY_PROMPT, SYSTEM_PROMPT,
};
use crate::store::{CompanionMessage, LibraryStore, MessageKind, Role};

/// Reply recorded in the conversation when a request fails
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// One prior turn handed to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Who spoke
    pub role: Role,
    /// What was said
    pub text: String,
}

/// Everything the generator sees for one request
///
/// The companion's instructions travel only in `system_prompt`; they are
/// never repeated as a turn in `history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Standing instructions
    pub system_prompt: String,
    /// Conversation turns preceding `message`, oldest first
    pub history: Vec<Turn>,
    /// The new user message
    pub message: String,
}

/// Failure reported by a [`TextGenerator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    /// Error carrying the backend's own description.
    pub fn new(message: impl Into<String>) -> Self {
        GenerationError {
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GenerationError {}

/// Text generation backend (an LLM client, a canned responder in tests).
pub trait TextGenerator {
    /// Produce a reply to `request`.
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Whether the backend has what it needs (credentials, endpoint) to run.
    fn is_configured(&self) -> bool {
        true
    }
}

impl<F> TextGenerator for F
where
    F: Fn(&GenerationRequest) -> Result<String, GenerationError>,
{
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self(request)
    }
}

/// Text of chapters `0..=current_chapter`, each headed `--- Chapter N ---`.
///
/// Empty chapters are left out. When the result is longer than
/// `config.max_context_chars` characters only the tail is kept, so the
/// chapters nearest the reader survive.
pub fn build_spoiler_safe_context<P: AsRef<Path>>(
    path: P,
    current_chapter: usize,
    config: &CompanionConfig,
) -> String {
    build_spoiler_safe_context_with_options(path, current_chapter, config, ReaderOptions::default())
}

/// [`build_spoiler_safe_context`] with explicit reader options.
pub fn build_spoiler_safe_context_with_options<P: AsRef<Path>>(
    path: P,
    current_chapter: usize,
    config: &CompanionConfig,
    options: ReaderOptions,
) -> String {
    let path = path.as_ref();
    let mut doc = match EpubDocument::open_with_options(path, options) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("Failed to open {} for context: {}", path.display(), err);
            return String::new();
        }
    };

    let mut parts = Vec::new();
    for index in 0..=current_chapter {
        match doc.chapter_text(index) {
            Ok(text) if !text.is_empty() => {
                parts.push(format!("--- Chapter {} ---\n{}", index + 1, text));
            }
            Ok(_) => {}
            Err(EpubError::ChapterOutOfBounds { .. }) => break,
            Err(err) => log::warn!("Skipping chapter {} in context: {}", index, err),
        }
    }
    keep_tail(parts.join("\n\n"), config.max_context_chars)
}

fn keep_tail(text: String, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    text.chars().skip(total - max_chars).collect()
}

/// Wrap `context` in the reader-context block that precedes every message.
pub fn reader_context_block(context: &str, current_chapter: usize) -> String {
    format!(
        "\n[READER CONTEXT]\n\
         Current reading position: Chapter {}\n\
         You must ONLY use information from the content below. Do not reference anything beyond this point.\n\
         \n\
         [BOOK CONTENT UP TO CURRENT POSITION]\n\
         {}\n\
         \n\
         [END OF AVAILABLE CONTENT]\n",
        current_chapter + 1,
        context
    )
}

/// A reader-facing companion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionRequest {
    /// Summary of the story so far
    Summary,
    /// Recap for a returning reader
    Recap,
    /// Character guide
    Characters,
    /// Explain a quoted passage
    Explain(String),
    /// Free-form question
    Question(String),
}

impl CompanionRequest {
    /// Tag recorded on both sides of the exchange.
    pub fn kind(&self) -> MessageKind {
        match self {
            CompanionRequest::Summary => MessageKind::Summary,
            CompanionRequest::Recap => MessageKind::Recap,
            CompanionRequest::Characters => MessageKind::Character,
            CompanionRequest::Explain(_) => MessageKind::Explain,
            CompanionRequest::Question(_) => MessageKind::Chat,
        }
    }

    /// What the reader sees as their own message.
    pub fn user_message(&self) -> String {
        match self {
            CompanionRequest::Summary => "What's happened so far in the story?".to_string(),
            CompanionRequest::Recap => "Give me a quick recap.".to_string(),
            CompanionRequest::Characters => "Who are the characters so far?".to_string(),
            CompanionRequest::Explain(text) => format!("Explain: {}", text),
            CompanionRequest::Question(text) => text.clone(),
        }
    }
}

/// Companion bound to one text generator.
#[derive(Debug, Clone)]
pub struct ReadingCompanion<G> {
    generator: G,
    config: CompanionConfig,
    options: ReaderOptions,
}

impl<G: TextGenerator> ReadingCompanion<G> {
    /// Companion with default limits.
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, CompanionConfig::default())
    }

    /// Companion with explicit limits.
    pub fn with_config(generator: G, config: CompanionConfig) -> Self {
        ReadingCompanion {
            generator,
            config,
            options: ReaderOptions::default(),
        }
    }

    /// Use explicit reader options when building context.
    pub fn with_reader_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Active limits.
    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// Whether the generator can be called at all.
    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    /// Send `message` with the book's context up to `current_chapter`.
    pub fn send<P: AsRef<Path>>(
        &self,
        message: &str,
        path: P,
        current_chapter: usize,
    ) -> Result<String, CompanionError> {
        if !self.is_configured() {
            return Err(CompanionError::Unconfigured);
        }
        let context = build_spoiler_safe_context_with_options(
            path,
            current_chapter,
            &self.config,
            self.options,
        );
        let request = GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            history: Vec::new(),
            message: format!(
                "{}\n\n{}",
                reader_context_block(&context, current_chapter),
                message
            ),
        };
        self.generator.generate(&request).map_err(|err| {
            log::error!("Companion request failed: {}", err);
            CompanionError::RequestFailed {
                cause: err.to_string(),
            }
        })
    }

    /// Answer a free-form question.
    pub fn ask_question<P: AsRef<Path>>(
        &self,
        question: &str,
        path: P,
        current_chapter: usize,
    ) -> Result<String, CompanionError> {
        self.send(question, path, current_chapter)
    }

    /// Summary of the story so far.
    pub fn summary<P: AsRef<Path>>(
        &self,
        path: P,
        current_chapter: usize,
    ) -> Result<String, CompanionError> {
        self.send(SUMMARY_PROMPT, path, current_chapter)
    }

    /// Short recap for a returning reader.
    pub fn recap<P: AsRef<Path>>(
        &self,
        path: P,
        current_chapter: usize,
    ) -> Result<String, CompanionError> {
        self.send(RECAP_PROMPT, path, current_chapter)
    }

    /// Characters met so far.
    pub fn character_guide<P: AsRef<Path>>(
        &self,
        path: P,
        current_chapter: usize,
    ) -> Result<String, CompanionError> {
        self.send(CHARACTER_PROMPT, path, current_chapter)
    }

    /// Explain a passage the reader quotes.
    pub fn explain_passage<P: AsRef<Path>>(
        &self,
        passage: &str,
        path: P,
        current_chapter: usize,
    ) -> Result<String, CompanionError> {
        let prompt = format!(
            "{}\n\nPassage the reader is asking about:\n\"{}\"",
            EXPLAIN_PROMPT, passage
        );
        self.send(&prompt, path, current_chapter)
    }

    /// Run `request` for a library book and record the exchange in its
    /// conversation history.
    ///
    /// The reading position comes from stored progress. A failed request is
    /// recorded as an apology and still returned as an error.
    pub fn converse(
        &self,
        store: &mut LibraryStore,
        book_id: &str,
        request: CompanionRequest,
    ) -> Result<CompanionMessage, CompanionError> {
        if !self.is_configured() {
            return Err(CompanionError::Unconfigured);
        }
        let path = store
            .book(book_id)
            .map(|book| book.file_path.clone())
            .ok_or_else(|| CompanionError::UnknownBook(book_id.to_string()))?;
        let current_chapter = store
            .progress(book_id)
            .map_or(0, |p| p.current_chapter_index);
        let kind = request.kind();

        store.add_message(
            book_id,
            CompanionMessage::new(Role::User, request.user_message(), Some(kind)),
        )?;

        let outcome = match &request {
            CompanionRequest::Summary => self.summary(&path, current_chapter),
            CompanionRequest::Recap => self.recap(&path, current_chapter),
            CompanionRequest::Characters => self.character_guide(&path, current_chapter),
            CompanionRequest::Explain(text) => self.ask_question(
                &format!("Please explain this: {}", text),
                &path,
                current_chapter,
            ),
            CompanionRequest::Question(text) => self.ask_question(text, &path, current_chapter),
        };

        match outcome {
            Ok(answer) => {
                let reply = CompanionMessage::new(Role::Assistant, answer, Some(kind));
                store.add_message(book_id, reply.clone())?;
                Ok(reply)
            }
            Err(err) => {
                store.add_message(
                    book_id,
                    CompanionMessage::new(Role::Assistant, APOLOGY_MESSAGE, Some(kind)),
                )?;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_tail_counts_chars() {
        assert_eq!(keep_tail("abcdef".to_string(), 10), "abcdef");
        assert_eq!(keep_tail("abcdef".to_string(), 3), "def");
        assert_eq!(keep_tail("ééé".to_string(), 2), "éé");
        assert_eq!(keep_tail("abc".to_string(), 0), "");
    }

    #[test]
    fn test_reader_context_block_is_one_based() {
        let block = reader_context_block("text here", 2);
        assert!(block.contains("Current reading position: Chapter 3"));
        assert!(block.contains("[BOOK CONTENT UP TO CURRENT POSITION]\ntext here\n"));
        assert!(block.trim_end().ends_with("[END OF AVAILABLE CONTENT]"));
    }

    #[test]
    fn test_context_for_missing_file_is_empty() {
        let context =
            build_spoiler_safe_context("/no/such/book.epub", 3, &CompanionConfig::default());
        assert_eq!(context, "");
    }

    #[test]
    fn test_request_messages() {
        assert_eq!(CompanionRequest::Recap.kind(), MessageKind::Recap);
        assert_eq!(
            CompanionRequest::Explain("the map".into()).user_message(),
            "Explain: the map"
        );
        assert_eq!(
            CompanionRequest::Question("Who is Ana?".into()).kind(),
            MessageKind::Chat
        );
    }

    struct Offline;

    impl TextGenerator for Offline {
        fn generate(&self, _: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(String::new())
        }

        fn is_configured(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_unconfigured_generator() {
        let companion = ReadingCompanion::new(Offline);
        assert_eq!(
            companion.summary("/no/such/book.epub", 0),
            Err(CompanionError::Unconfigured)
        );
    }

    #[test]
    fn test_generator_failure_maps_to_request_failed() {
        let companion = ReadingCompanion::new(
            |_: &GenerationRequest| -> Result<String, GenerationError> {
                Err(GenerationError::new("quota exceeded"))
            },
        );
        let err = companion.recap("/no/such/book.epub", 0).unwrap_err();
        assert!(matches!(err, CompanionError::RequestFailed { .. }));
        assert_eq!(err.to_string(), "Failed to get AI response. Please try again.");
    }

    #[test]
    fn test_instructions_sent_once_as_system_prompt() {
        let companion = ReadingCompanion::new(|req: &GenerationRequest| -> Result<String, GenerationError> {
            assert_eq!(req.system_prompt, SYSTEM_PROMPT);
            assert!(req.history.iter().all(|turn| turn.text != SYSTEM_PROMPT));
            assert!(!req.message.contains(SYSTEM_PROMPT));
            assert!(req.message.starts_with("\n[READER CONTEXT]"));
            assert!(req.message.ends_with("Why?"));
            Ok("Because.".to_string())
        });
        assert_eq!(
            companion.ask_question("Why?", "/no/such/book.epub", 0).unwrap(),
            "Because."
        );
    }
}
