//! Application controller
//!
//! Owns navigation state and the search/favorites services, and processes
//! commands from the frontend through a single crossbeam channel. Network
//! and storage work runs on short-lived worker threads that report back
//! through the same channel.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::config::controller::COMMAND_CHANNEL_CAPACITY;
use crate::data::favorites::{AddResult, FavoritesStore};
use crate::data::types::Book;
use crate::error::SearchError;
use crate::providers::BookProvider;

use super::state::{AppCommand, AppSnapshot, Notice, Screen};

/// Create the command channel shared by a frontend and the controller
pub fn command_channel() -> (Sender<AppCommand>, Receiver<AppCommand>) {
    bounded(COMMAND_CHANNEL_CAPACITY)
}

pub struct AppController {
    cmd_rx: Receiver<AppCommand>,
    cmd_tx: Sender<AppCommand>,
    shared_state: Arc<Mutex<AppSnapshot>>,
    provider: Arc<dyn BookProvider>,
    favorites: Arc<FavoritesStore>,
    /// Monotonically increasing counter to discard stale search results
    search_generation: u64,
    /// Same, for favorites loads
    favorites_generation: u64,
}

impl AppController {
    pub fn new(
        cmd_rx: Receiver<AppCommand>,
        cmd_tx: Sender<AppCommand>,
        shared_state: Arc<Mutex<AppSnapshot>>,
        provider: Arc<dyn BookProvider>,
        favorites: Arc<FavoritesStore>,
    ) -> Self {
        Self {
            cmd_rx,
            cmd_tx,
            shared_state,
            provider,
            favorites,
            search_generation: 0,
            favorites_generation: 0,
        }
    }

    /// Run the controller event loop (blocking, call from a dedicated thread)
    pub fn run(&mut self) {
        tracing::debug!(provider = self.provider.name(), "controller started");
        while let Ok(cmd) = self.cmd_rx.recv() {
            if self.handle_command(cmd) {
                break;
            }
        }
        tracing::debug!("controller stopped");
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AppSnapshot> {
        self.shared_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle a single command. Returns true if the loop should exit.
    fn handle_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Shutdown => return true,

            AppCommand::Search(query) => self.start_search(query),
            AppCommand::OpenDetail(book) => self.open_detail(book),
            AppCommand::OpenFavorites => {
                self.navigate_to(Screen::Favorites);
                self.refresh_favorites();
            }
            AppCommand::AddFavorite => self.add_favorite(),
            AppCommand::RefreshFavorites => self.refresh_favorites(),
            AppCommand::Back => self.go_back(),
            AppCommand::DismissNotice => {
                self.lock_state().notice = None;
            }

            AppCommand::InternalSearchFinished { generation, result } => {
                self.handle_search_finished(generation, result);
            }
            AppCommand::InternalFavoritesLoaded { generation, books } => {
                self.handle_favorites_loaded(generation, books);
            }
            AppCommand::InternalFavoriteAdded { book_id, result } => {
                tracing::debug!(book_id = %book_id, ?result, "favorite add finished");
                let mut state = self.lock_state();
                state.is_adding = false;
                if is_detail_book(&state, &book_id)
                    && matches!(result, AddResult::Added | AddResult::AlreadyPresent)
                {
                    state.in_favorites = true;
                }
                state.notice = Some(Notice::for_add_result(&result));
            }
            AppCommand::InternalFavoriteChecked { book_id, present } => {
                let mut state = self.lock_state();
                // Favorites only grow, so a late answer can set the flag but never clear it
                if is_detail_book(&state, &book_id) {
                    state.in_favorites |= present;
                }
            }
        }
        false
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Show `screen`, returning to it if it is already on the stack
    fn navigate_to(&self, screen: Screen) {
        let mut state = self.lock_state();
        if state.screen == screen {
            return;
        }
        match state.history.iter().position(|s| *s == screen) {
            Some(pos) => state.history.truncate(pos),
            None => {
                let current = state.screen;
                state.history.push(current);
            }
        }
        state.screen = screen;
        drop_unreachable_detail(&mut state);
    }

    fn open_detail(&self, book: Book) {
        let book_id = book.id.clone();
        {
            let mut state = self.lock_state();
            state.detail = Some(book);
            state.in_favorites = false;
        }
        self.navigate_to(Screen::Detail);
        self.check_favorite(book_id);
    }

    fn go_back(&mut self) {
        let revealed = {
            let mut state = self.lock_state();
            let Some(previous) = state.history.pop() else {
                return;
            };
            state.screen = previous;
            drop_unreachable_detail(&mut state);
            previous
        };

        if revealed == Screen::Favorites {
            self.refresh_favorites();
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Run the search on a worker thread, then send the result back.
    ///
    /// Each call increments `search_generation`; results from earlier
    /// calls are discarded in `handle_search_finished`.
    fn start_search(&mut self, query: String) {
        let query = query.trim().to_string();
        if query.is_empty() {
            return;
        }

        self.search_generation += 1;
        let generation = self.search_generation;

        {
            let mut state = self.lock_state();
            state.query = query.clone();
            state.is_searching = true;
            state.search_error = None;
        }

        let provider = Arc::clone(&self.provider);
        let cmd_tx = self.cmd_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("book-search".into())
            .spawn(move || {
                let result = provider.search(&query);
                let _ = cmd_tx.send(AppCommand::InternalSearchFinished { generation, result });
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to spawn search thread");
            self.handle_search_finished(
                generation,
                Err(SearchError::new(format!("Could not start search: {e}"))),
            );
        }
    }

    fn handle_search_finished(&mut self, generation: u64, result: Result<Vec<Book>, SearchError>) {
        if generation != self.search_generation {
            // A newer search was issued while this one was in flight
            tracing::debug!(generation, current = self.search_generation, "discarding stale search result");
            return;
        }

        let mut state = self.lock_state();
        state.is_searching = false;
        match result {
            Ok(books) => {
                state.results = books;
                state.search_error = None;
            }
            Err(e) => {
                state.search_error = Some(format!("Error searching books: {e}"));
            }
        }
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    fn refresh_favorites(&mut self) {
        self.favorites_generation += 1;
        let generation = self.favorites_generation;
        self.lock_state().is_loading_favorites = true;

        let favorites = Arc::clone(&self.favorites);
        let cmd_tx = self.cmd_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("favorites-load".into())
            .spawn(move || {
                let books = favorites.get_all();
                let _ = cmd_tx.send(AppCommand::InternalFavoritesLoaded { generation, books });
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to spawn favorites thread");
            let books = self.favorites.get_all();
            self.handle_favorites_loaded(generation, books);
        }
    }

    fn handle_favorites_loaded(&mut self, generation: u64, books: Vec<Book>) {
        if generation != self.favorites_generation {
            return;
        }
        let mut state = self.lock_state();
        state.is_loading_favorites = false;
        state.favorites = books;
    }

    /// Look up whether `book_id` is stored, on a worker thread
    fn check_favorite(&self, book_id: String) {
        let favorites = Arc::clone(&self.favorites);
        let cmd_tx = self.cmd_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("favorites-check".into())
            .spawn(move || {
                let present = favorites.contains(&book_id);
                let _ = cmd_tx.send(AppCommand::InternalFavoriteChecked { book_id, present });
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to spawn favorites thread");
        }
    }

    fn add_favorite(&mut self) {
        let book = {
            let mut state = self.lock_state();
            if state.is_adding {
                return;
            }
            let Some(book) = state.detail.clone() else {
                return;
            };
            state.is_adding = true;
            book
        };

        let favorites = Arc::clone(&self.favorites);
        let cmd_tx = self.cmd_tx.clone();
        let book_id = book.id.clone();
        let spawned = std::thread::Builder::new()
            .name("favorites-add".into())
            .spawn(move || {
                let result = favorites.add(book);
                let _ = cmd_tx.send(AppCommand::InternalFavoriteAdded { book_id, result });
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to spawn favorites thread");
            let mut state = self.lock_state();
            state.is_adding = false;
            state.notice = Some(Notice::error(format!("Could not save favorite: {e}")));
        }
    }
}

fn is_detail_book(state: &AppSnapshot, book_id: &str) -> bool {
    state.detail.as_ref().is_some_and(|b| b.id == book_id)
}

/// Forget the detail book once no Detail screen is visible or stacked
fn drop_unreachable_detail(state: &mut AppSnapshot) {
    if state.screen != Screen::Detail && !state.history.contains(&Screen::Detail) {
        state.detail = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::NoticeKind;
    use crate::data::storage::MemoryStore;
    use std::time::Duration;

    /// Provider returning canned results keyed by query
    struct MockProvider;

    impl BookProvider for MockProvider {
        fn name(&self) -> &'static str {
            "Mock"
        }

        fn search(&self, query: &str) -> Result<Vec<Book>, SearchError> {
            match query {
                "dune" => Ok(vec![
                    Book::new("abc123", "Dune").with_authors(["Frank Herbert"]),
                    Book::new("def456", "Dune Messiah"),
                ]),
                "offline" => Err(SearchError::new("Could not connect to www.googleapis.com")),
                "slow" => {
                    std::thread::sleep(Duration::from_millis(200));
                    Ok(vec![Book::new("slow-1", "Slow Result")])
                }
                other => Ok(vec![Book::new(format!("{other}-1"), other.to_string())]),
            }
        }

        fn get_volume(&self, _id: &str) -> Result<Option<Book>, SearchError> {
            Ok(None)
        }
    }

    fn controller() -> AppController {
        let (tx, rx) = command_channel();
        AppController::new(
            rx,
            tx,
            Arc::new(Mutex::new(AppSnapshot::default())),
            Arc::new(MockProvider),
            Arc::new(FavoritesStore::new(MemoryStore::new())),
        )
    }

    /// Handle the next worker result
    fn pump(ctrl: &mut AppController) {
        let cmd = ctrl
            .cmd_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker result");
        ctrl.handle_command(cmd);
    }

    fn snapshot(ctrl: &AppController) -> AppSnapshot {
        ctrl.lock_state().clone()
    }

    #[test]
    fn test_search_populates_results() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::Search("dune".into()));
        assert!(snapshot(&ctrl).is_searching);

        pump(&mut ctrl);
        let state = snapshot(&ctrl);
        assert!(!state.is_searching);
        assert_eq!(state.query, "dune");
        assert_eq!(state.results.len(), 2);
        assert!(state.results.iter().all(|b| !b.id.is_empty()));
    }

    #[test]
    fn test_empty_query_is_noop() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::Search("   ".into()));

        let state = snapshot(&ctrl);
        assert!(!state.is_searching);
        assert_eq!(ctrl.search_generation, 0);
        assert!(ctrl.cmd_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_search_error_is_inline() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::Search("dune".into()));
        pump(&mut ctrl);

        ctrl.handle_command(AppCommand::Search("offline".into()));
        pump(&mut ctrl);

        let state = snapshot(&ctrl);
        assert!(!state.is_searching);
        assert_eq!(
            state.search_error.as_deref(),
            Some("Error searching books: Could not connect to www.googleapis.com")
        );
        // Previous results stay visible
        assert_eq!(state.results.len(), 2);
    }

    #[test]
    fn test_latest_search_wins() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::Search("slow".into()));
        ctrl.handle_command(AppCommand::Search("fast".into()));

        pump(&mut ctrl);
        pump(&mut ctrl);

        let state = snapshot(&ctrl);
        assert!(!state.is_searching);
        assert_eq!(state.query, "fast");
        assert_eq!(state.results, vec![Book::new("fast-1", "fast")]);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut ctrl = controller();
        ctrl.search_generation = 3;
        ctrl.handle_command(AppCommand::InternalSearchFinished {
            generation: 2,
            result: Ok(vec![Book::new("old", "Old")]),
        });
        assert!(snapshot(&ctrl).results.is_empty());
    }

    #[test]
    fn test_navigation_stack() {
        let mut ctrl = controller();
        let book = Book::new("abc123", "Dune");

        ctrl.handle_command(AppCommand::OpenDetail(book.clone()));
        let state = snapshot(&ctrl);
        assert_eq!(state.screen, Screen::Detail);
        assert_eq!(state.history, vec![Screen::Search]);
        assert_eq!(state.detail, Some(book));

        ctrl.handle_command(AppCommand::Back);
        let state = snapshot(&ctrl);
        assert_eq!(state.screen, Screen::Search);
        assert!(state.detail.is_none());

        // Back at the root does nothing
        ctrl.handle_command(AppCommand::Back);
        assert_eq!(snapshot(&ctrl).screen, Screen::Search);
    }

    #[test]
    fn test_opening_detail_twice_replaces_book() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::OpenDetail(Book::new("a", "A")));
        ctrl.handle_command(AppCommand::OpenDetail(Book::new("b", "B")));

        let state = snapshot(&ctrl);
        assert_eq!(state.history, vec![Screen::Search]);
        assert_eq!(state.detail.map(|b| b.id), Some("b".to_string()));
    }

    #[test]
    fn test_navigating_to_stacked_screen_pops_back() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::OpenFavorites);
        pump(&mut ctrl);
        ctrl.handle_command(AppCommand::OpenDetail(Book::new("a", "A")));
        pump(&mut ctrl);
        ctrl.handle_command(AppCommand::OpenFavorites);
        pump(&mut ctrl);

        let state = snapshot(&ctrl);
        assert_eq!(state.screen, Screen::Favorites);
        assert_eq!(state.history, vec![Screen::Search]);
        assert!(state.detail.is_none());
    }

    #[test]
    fn test_add_without_detail_is_noop() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::AddFavorite);
        assert!(!snapshot(&ctrl).is_adding);
        assert!(ctrl.cmd_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_second_add_while_saving_is_ignored() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::OpenDetail(Book::new("abc123", "Dune")));
        pump(&mut ctrl);

        ctrl.handle_command(AppCommand::AddFavorite);
        ctrl.handle_command(AppCommand::AddFavorite);
        pump(&mut ctrl);

        assert_eq!(
            snapshot(&ctrl).notice,
            Some(Notice::info("Book added to favorites!"))
        );
        assert!(ctrl.cmd_rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_detail_reports_stored_favorite() {
        let favorites = FavoritesStore::new(MemoryStore::new());
        favorites.add(Book::new("abc123", "Dune"));
        let (tx, rx) = command_channel();
        let mut ctrl = AppController::new(
            rx,
            tx,
            Arc::new(Mutex::new(AppSnapshot::default())),
            Arc::new(MockProvider),
            Arc::new(favorites),
        );

        ctrl.handle_command(AppCommand::OpenDetail(Book::new("abc123", "Dune")));
        pump(&mut ctrl);
        assert!(snapshot(&ctrl).in_favorites);

        // Switching books clears the flag until the new lookup answers
        ctrl.handle_command(AppCommand::OpenDetail(Book::new("def456", "Dune Messiah")));
        assert!(!snapshot(&ctrl).in_favorites);
        pump(&mut ctrl);
        assert!(!snapshot(&ctrl).in_favorites);
    }

    #[test]
    fn test_membership_answer_for_other_book_is_ignored() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::OpenDetail(Book::new("a", "A")));
        pump(&mut ctrl);

        ctrl.handle_command(AppCommand::InternalFavoriteChecked {
            book_id: "b".into(),
            present: true,
        });
        assert!(!snapshot(&ctrl).in_favorites);
    }

    #[test]
    fn test_dismiss_notice() {
        let mut ctrl = controller();
        ctrl.lock_state().notice = Some(Notice::info("hello"));
        ctrl.handle_command(AppCommand::DismissNotice);
        assert!(snapshot(&ctrl).notice.is_none());
    }

    #[test]
    fn test_add_result_becomes_notice() {
        let mut ctrl = controller();
        ctrl.handle_command(AppCommand::InternalFavoriteAdded {
            book_id: "x".into(),
            result: AddResult::StorageFailure("disk full".into()),
        });
        let notice = snapshot(&ctrl).notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
    }

    #[test]
    fn test_dune_scenario() {
        let mut ctrl = controller();

        // Search
        ctrl.handle_command(AppCommand::Search("dune".into()));
        pump(&mut ctrl);
        let selected = snapshot(&ctrl)
            .results
            .into_iter()
            .find(|b| b.title == "Dune")
            .unwrap();
        assert_eq!(selected.id, "abc123");

        // Detail
        ctrl.handle_command(AppCommand::OpenDetail(selected));
        pump(&mut ctrl);
        let state = snapshot(&ctrl);
        assert_eq!(state.screen, Screen::Detail);
        assert_eq!(state.detail.as_ref().map(|b| b.title.as_str()), Some("Dune"));
        assert!(!state.in_favorites);

        // Add
        ctrl.handle_command(AppCommand::AddFavorite);
        assert!(snapshot(&ctrl).is_adding);
        pump(&mut ctrl);
        let state = snapshot(&ctrl);
        assert!(!state.is_adding);
        assert!(state.in_favorites);
        assert_eq!(state.notice, Some(Notice::info("Book added to favorites!")));

        // Favorites
        ctrl.handle_command(AppCommand::Back);
        ctrl.handle_command(AppCommand::OpenFavorites);
        assert!(snapshot(&ctrl).is_loading_favorites);
        pump(&mut ctrl);
        let state = snapshot(&ctrl);
        assert_eq!(state.screen, Screen::Favorites);
        assert!(!state.is_loading_favorites);
        assert_eq!(state.favorites.len(), 1);
        assert_eq!(state.favorites[0].title, "Dune");

        // Open it from favorites and add again
        let favorite = state.favorites[0].clone();
        ctrl.handle_command(AppCommand::OpenDetail(favorite));
        pump(&mut ctrl);
        assert!(snapshot(&ctrl).in_favorites);
        ctrl.handle_command(AppCommand::AddFavorite);
        pump(&mut ctrl);
        assert_eq!(
            snapshot(&ctrl).notice,
            Some(Notice::info("This book is already in your favorites."))
        );

        // Back to favorites refreshes; count stays 1
        ctrl.handle_command(AppCommand::Back);
        pump(&mut ctrl);
        let state = snapshot(&ctrl);
        assert_eq!(state.screen, Screen::Favorites);
        assert_eq!(state.history, vec![Screen::Search]);
        assert_eq!(state.favorites.len(), 1);
    }

    #[test]
    fn test_run_exits_on_shutdown() {
        let (tx, rx) = command_channel();
        let state = Arc::new(Mutex::new(AppSnapshot::default()));
        let mut ctrl = AppController::new(
            rx,
            tx.clone(),
            Arc::clone(&state),
            Arc::new(MockProvider),
            Arc::new(FavoritesStore::new(MemoryStore::new())),
        );

        let handle = std::thread::spawn(move || ctrl.run());
        tx.send(AppCommand::OpenDetail(Book::new("a", "A"))).unwrap();
        tx.send(AppCommand::Shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(state.lock().unwrap().screen, Screen::Detail);
    }
}
