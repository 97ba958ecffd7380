//! Bookshelf CLI: search Google Books and keep a list of favorites

mod logging;
mod tui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

use bookshelf::app::{command_channel, AppCommand, AppController, AppSnapshot, Notice, NoticeKind};
use bookshelf::config::storage::LOG_FILE;
use bookshelf::data::{Book, FavoritesStore, FileStore, Settings};
use bookshelf::providers::{BookProvider, GoogleBooksProvider};

use logging::LogTarget;

#[derive(Parser)]
#[command(name = "bookshelf", about = "Search books and keep a list of favorites", version)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the favorites file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Google Books API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter, e.g. "debug" or "bookshelf=trace" (RUST_LOG wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive search / detail / favorites screens (default)
    Tui,
    /// Search the catalog and print matching books
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Print details for one book
    Show {
        /// Provider book id
        id: String,
    },
    /// Look up a book by id and add it to favorites
    Add {
        /// Provider book id
        id: String,
    },
    /// List favorite books
    Favorites,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (settings, settings_error) = load_settings(&cli);
    let data_dir = settings.resolved_data_dir()?;

    let command = cli.command.unwrap_or(Command::Tui);
    let log_path = data_dir.join(LOG_FILE);
    let target = match command {
        Command::Tui => LogTarget::File(&log_path),
        _ => LogTarget::Stderr,
    };
    logging::init(&settings.log_level, target);

    if let Some(e) = settings_error {
        tracing::warn!(error = %e, "ignoring unreadable settings file, using defaults");
    }
    tracing::debug!(data_dir = %data_dir.display(), api = %settings.api_base_url, "starting");

    let provider = GoogleBooksProvider::from_settings(&settings)?;
    let favorites = FavoritesStore::new(FileStore::new(&data_dir));

    match command {
        Command::Tui => run_tui(provider, favorites),
        Command::Search { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                return Ok(());
            }
            match provider.search(query.trim()) {
                Ok(books) if books.is_empty() => println!("No books found."),
                Ok(books) => books.iter().for_each(print_book_line),
                Err(e) => {
                    eprintln!("Error searching books: {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Command::Show { id } => {
            let book = lookup(&provider, &id);
            print_book_detail(&book);
            Ok(())
        }
        Command::Add { id } => {
            let book = lookup(&provider, &id);
            let notice = Notice::for_add_result(&favorites.add(book));
            match notice.kind {
                NoticeKind::Info => println!("{}", notice.text),
                NoticeKind::Error => {
                    eprintln!("{}", notice.text);
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Command::Favorites => {
            let books = favorites.get_all();
            if books.is_empty() {
                println!("No favorite books yet.");
            }
            books.iter().for_each(print_book_line);
            Ok(())
        }
    }
}

/// Settings from file plus command-line overrides
///
/// An unreadable file falls back to defaults; the error is returned so it
/// can be logged once tracing is up.
fn load_settings(cli: &Cli) -> (Settings, Option<bookshelf::AppError>) {
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let (mut settings, error) = match loaded {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    if let Some(dir) = &cli.data_dir {
        settings.data_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    (settings, error)
}

/// Resolve a book by id or exit with a message
fn lookup(provider: &GoogleBooksProvider, id: &str) -> Book {
    match provider.get_volume(id) {
        Ok(Some(book)) => book,
        Ok(None) => {
            eprintln!("No book with id '{id}'");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error looking up book: {e}");
            std::process::exit(1);
        }
    }
}

fn run_tui(
    provider: GoogleBooksProvider,
    favorites: FavoritesStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let (cmd_tx, cmd_rx) = command_channel();
    let shared_state = Arc::new(Mutex::new(AppSnapshot::default()));

    let mut controller = AppController::new(
        cmd_rx,
        cmd_tx.clone(),
        shared_state.clone(),
        Arc::new(provider),
        Arc::new(favorites),
    );
    let controller_thread = std::thread::Builder::new()
        .name("controller".into())
        .spawn(move || controller.run())?;

    let result = tui::run(&cmd_tx, &shared_state);

    let _ = cmd_tx.send(AppCommand::Shutdown);
    let _ = controller_thread.join();
    result.map_err(Into::into)
}

fn print_book_line(book: &Book) {
    let authors = book.authors_line();
    if authors.is_empty() {
        println!("{:<14} {}", book.id, book.display_title());
    } else {
        println!("{:<14} {} ({})", book.id, book.display_title(), authors);
    }
}

fn print_book_detail(book: &Book) {
    println!("{}", book.display_title());
    let authors = book.authors_line();
    if !authors.is_empty() {
        println!("by {authors}");
    }
    println!();
    println!("{}", book.display_description());
    println!();
    println!("Published: {}", book.display_published_date());
    if let Some(url) = &book.thumbnail_url {
        println!("Cover:     {url}");
    }
    println!("Id:        {}", book.id);
}
