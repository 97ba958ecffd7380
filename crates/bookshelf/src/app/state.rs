//! Shared application state and commands
//!
//! `AppCommand` is the command type sent by any frontend (TUI, tests).
//! `AppSnapshot` is the shared state frontends render from.

use crate::data::favorites::AddResult;
use crate::data::types::Book;
use crate::error::SearchError;

/// The three screens of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Query input and result list (navigation root)
    #[default]
    Search,
    /// One book's details with an add-to-favorites action
    Detail,
    /// The persisted favorites list
    Favorites,
}

/// Commands sent by a frontend
#[derive(Debug)]
pub enum AppCommand {
    // Search screen
    Search(String),
    OpenDetail(Book),
    OpenFavorites,

    // Detail screen
    AddFavorite,

    // Favorites screen
    RefreshFavorites,

    // Navigation
    Back,
    DismissNotice,

    // Shutdown the controller
    Shutdown,

    // Internal: worker results (not sent by frontends)
    InternalSearchFinished {
        generation: u64,
        result: Result<Vec<Book>, SearchError>,
    },
    InternalFavoritesLoaded {
        generation: u64,
        books: Vec<Book>,
    },
    InternalFavoriteAdded {
        book_id: String,
        result: AddResult,
    },
    InternalFavoriteChecked {
        book_id: String,
        present: bool,
    },
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient message shown over the current screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    /// Notice describing the outcome of an add-to-favorites
    pub fn for_add_result(result: &AddResult) -> Self {
        match result {
            AddResult::Added => Notice::info("Book added to favorites!"),
            AddResult::AlreadyPresent => Notice::info("This book is already in your favorites."),
            AddResult::StorageFailure(msg) => {
                Notice::error(format!("Could not save favorite: {msg}"))
            }
        }
    }
}

/// Snapshot of app state, shared between the controller and frontends
#[derive(Clone, Debug, Default)]
pub struct AppSnapshot {
    /// Currently visible screen
    pub screen: Screen,
    /// Screens below the current one (root first)
    pub history: Vec<Screen>,

    // Search
    /// Last submitted query
    pub query: String,
    pub results: Vec<Book>,
    pub is_searching: bool,
    /// Inline error from the last search
    pub search_error: Option<String>,

    // Detail
    /// Book shown on the detail screen
    pub detail: Option<Book>,
    pub is_adding: bool,
    /// Whether the detail book is already stored as a favorite
    pub in_favorites: bool,

    // Favorites
    pub favorites: Vec<Book>,
    pub is_loading_favorites: bool,

    pub notice: Option<Notice>,
}
