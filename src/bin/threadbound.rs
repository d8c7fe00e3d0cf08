use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use threadbound::{
    build_spoiler_safe_context, get_chapter_content, CompanionConfig, EpubDocument, Library,
    LibraryConfig, LibraryError,
};

#[derive(Parser, Debug)]
#[command(name = "threadbound", version, about = "Inspect EPUB files and manage a reading library")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    /// Library home directory (defaults to $THREADBOUND_HOME, then ./.threadbound)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Title, author, cover path and chapter list of an EPUB
    Metadata {
        epub: PathBuf,
    },
    /// Ordered chapter list of an EPUB
    Chapters {
        epub: PathBuf,
    },
    /// Plain text of one chapter
    ChapterText {
        epub: PathBuf,
        /// Zero-based chapter index; out-of-range values print nothing
        #[arg(long, allow_negative_numbers = true)]
        index: i64,
        /// Emit the text as-is instead of JSON
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Spoiler-safe text up to and including a chapter
    Context {
        epub: PathBuf,
        /// Zero-based index of the reader's current chapter
        #[arg(long)]
        chapter: usize,
        /// Context cap in characters
        #[arg(long)]
        max_chars: Option<usize>,
    },
    /// Copy an EPUB into the library
    Import {
        epub: PathBuf,
    },
    /// List imported books
    List,
    /// Remove a book and everything recorded about it
    Remove {
        id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChapterTextOutput<'a> {
    epub: &'a PathBuf,
    index: i64,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextOutput<'a> {
    epub: &'a PathBuf,
    chapter: usize,
    context: &'a str,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let pretty = cli.pretty;
    match &cli.command {
        Command::Metadata { epub } => {
            print_json(&threadbound::parse_metadata(epub), pretty)?;
        }
        Command::Chapters { epub } => {
            let chapters = match EpubDocument::open(epub) {
                Ok(mut doc) => doc.chapters(),
                Err(_) => Vec::new(),
            };
            print_json(&chapters, pretty)?;
        }
        Command::ChapterText { epub, index, raw } => {
            let text = usize::try_from(*index)
                .map(|i| get_chapter_content(epub, i))
                .unwrap_or_default();
            if *raw {
                print!("{}", text);
            } else {
                print_json(
                    &ChapterTextOutput {
                        epub,
                        index: *index,
                        text: &text,
                    },
                    pretty,
                )?;
            }
        }
        Command::Context {
            epub,
            chapter,
            max_chars,
        } => {
            let mut config = CompanionConfig::default();
            if let Some(max) = max_chars {
                config = config.with_max_context_chars(*max);
            }
            let context = build_spoiler_safe_context(epub, *chapter, &config);
            print_json(
                &ContextOutput {
                    epub,
                    chapter: *chapter,
                    context: &context,
                },
                pretty,
            )?;
        }
        Command::Import { epub } => {
            let mut library = open_library(&cli)?;
            let book = library.import_book(epub).map_err(display_err)?;
            print_json(&book, pretty)?;
        }
        Command::List => {
            let library = open_library(&cli)?;
            print_json(library.books(), pretty)?;
        }
        Command::Remove { id } => {
            let mut library = open_library(&cli)?;
            library.delete_book(id).map_err(display_err)?;
        }
    }
    Ok(())
}

fn open_library(cli: &Cli) -> Result<Library, String> {
    let config = match &cli.home {
        Some(home) => LibraryConfig::with_home(home),
        None => LibraryConfig::from_env(),
    };
    Library::open(config).map_err(display_err)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!("{}", rendered.map_err(|e| e.to_string())?);
    Ok(())
}

fn display_err(err: LibraryError) -> String {
    err.to_string()
}
