//! Favorites store
//!
//! Persists the user's favorite books as one JSON array under a fixed
//! storage key. Every write replaces the whole collection.

use crate::config::storage::FAVORITES_KEY;
use crate::data::storage::KeyValueStore;
use crate::data::types::Book;
use std::sync::Mutex;

/// Outcome of [`FavoritesStore::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddResult {
    /// The book was appended and the collection persisted
    Added,
    /// A book with the same id is already stored; nothing was written
    AlreadyPresent,
    /// Persisting failed; the stored collection is unchanged
    StorageFailure(String),
}

/// Owner of the persisted favorites collection
///
/// Reads never fail: a missing or unreadable collection is an empty one.
/// `add` runs its read, dedup check, and replace under one lock, so two
/// adds on the same store cannot interleave.
pub struct FavoritesStore {
    backend: Box<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl FavoritesStore {
    /// Create a store on top of a key-value backend
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            write_lock: Mutex::new(()),
        }
    }

    /// All favorites in insertion order
    pub fn get_all(&self) -> Vec<Book> {
        let raw = match self.backend.get(FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read favorites, treating as empty");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<Book>>(&raw) {
            Ok(books) => books,
            Err(e) => {
                tracing::warn!(error = %e, "stored favorites are corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Whether a book with this id is stored
    pub fn contains(&self, id: &str) -> bool {
        self.get_all().iter().any(|b| b.id == id)
    }

    /// Append a book unless one with the same id is already stored
    pub fn add(&self, book: Book) -> AddResult {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.get_all();
        let next = match next_collection(current, book) {
            Some(next) => next,
            None => return AddResult::AlreadyPresent,
        };

        let serialized = match serde_json::to_string(&next) {
            Ok(s) => s,
            Err(e) => return AddResult::StorageFailure(format!("Failed to serialize favorites: {e}")),
        };

        match self.backend.set(FAVORITES_KEY, &serialized) {
            Ok(()) => {
                tracing::info!(count = next.len(), "favorites saved");
                AddResult::Added
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not save favorites");
                AddResult::StorageFailure(e.to_string())
            }
        }
    }
}

/// Compute the collection after adding `book`, `None` if its id is taken
fn next_collection(mut current: Vec<Book>, book: Book) -> Option<Vec<Book>> {
    if current.iter().any(|b| b.id == book.id) {
        return None;
    }
    current.push(book);
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::storage::{FileStore, MemoryStore};
    use crate::error::{AppError, Result};
    use std::env::temp_dir;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_dir_path() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        temp_dir().join(format!("bookshelf_fav_test_{}_{}", std::process::id(), id))
    }

    /// Backend whose writes always fail
    struct FailingStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(AppError::Storage("disk full".to_string()))
        }
    }

    fn dune() -> Book {
        Book::new("abc123", "Dune")
            .with_authors(["Frank Herbert"])
            .with_description_opt(Some("Spice.".to_string()))
            .with_published_date_opt(Some("1965".to_string()))
            .with_thumbnail_opt(Some("http://img.example/dune.jpg".to_string()))
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let store = FavoritesStore::new(MemoryStore::new());
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_add_then_duplicate() {
        let store = FavoritesStore::new(MemoryStore::new());

        assert_eq!(store.add(dune()), AddResult::Added);
        assert_eq!(store.add(dune()), AddResult::AlreadyPresent);

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "abc123");
    }

    #[test]
    fn test_duplicate_by_id_first_write_wins() {
        let store = FavoritesStore::new(MemoryStore::new());

        store.add(Book::new("same", "First"));
        let result = store.add(Book::new("same", "Second"));

        assert_eq!(result, AddResult::AlreadyPresent);
        assert_eq!(store.get_all()[0].title, "First");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let store = FavoritesStore::new(MemoryStore::new());
        for id in ["c", "a", "b"] {
            assert_eq!(store.add(Book::new(id, id.to_uppercase())), AddResult::Added);
        }

        let ids: Vec<_> = store.get_all().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_roundtrip_preserves_all_fields() {
        let store = FavoritesStore::new(MemoryStore::new());
        store.add(dune());
        assert_eq!(store.get_all(), vec![dune()]);
    }

    #[test]
    fn test_corrupt_value_reads_as_empty() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(FAVORITES_KEY, "{not json").unwrap();

        let store = FavoritesStore::new(Arc::clone(&backend));
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_add_over_corrupt_value_starts_fresh() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(FAVORITES_KEY, "garbage").unwrap();

        let store = FavoritesStore::new(Arc::clone(&backend));
        assert_eq!(store.add(dune()), AddResult::Added);
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_storage_failure_leaves_state_unchanged() {
        let inner = MemoryStore::new();
        let seeded = serde_json::to_string(&vec![Book::new("old", "Old")]).unwrap();
        inner.set(FAVORITES_KEY, &seeded).unwrap();

        let store = FavoritesStore::new(FailingStore { inner });
        let result = store.add(dune());

        assert_eq!(result, AddResult::StorageFailure("Storage error: disk full".to_string()));
        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "old");
    }

    #[test]
    fn test_contains() {
        let store = FavoritesStore::new(MemoryStore::new());
        assert!(!store.contains("abc123"));
        store.add(dune());
        assert!(store.contains("abc123"));
    }

    #[test]
    fn test_concurrent_adds_of_same_book() {
        let store = Arc::new(FavoritesStore::new(MemoryStore::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.add(dune()))
            })
            .collect();

        let results: Vec<AddResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let added = results.iter().filter(|r| **r == AddResult::Added).count();

        assert_eq!(added, 1);
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_concurrent_adds_of_distinct_books() {
        let store = Arc::new(FavoritesStore::new(MemoryStore::new()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.add(Book::new(format!("id-{i}"), "Book")))
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), AddResult::Added);
        }
        assert_eq!(store.get_all().len(), 8);
    }

    // =========================================================================
    // Persistence tests
    // =========================================================================

    #[test]
    fn test_file_backed_persists_across_instances() {
        let dir = temp_dir_path();

        {
            let store = FavoritesStore::new(FileStore::new(&dir));
            assert_eq!(store.add(dune()), AddResult::Added);
            assert_eq!(store.add(Book::new("second", "Children of Dune")), AddResult::Added);
        }

        {
            let store = FavoritesStore::new(FileStore::new(&dir));
            let all = store.get_all();
            assert_eq!(all.len(), 2);
            assert_eq!(all[0], dune());
            assert_eq!(all[1].title, "Children of Dune");
        }

        assert!(dir.join("favoritos.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_backed_corrupt_file_reads_as_empty() {
        let dir = temp_dir_path();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("favoritos.json"), "[{\"id\": ").unwrap();

        let store = FavoritesStore::new(FileStore::new(&dir));
        assert!(store.get_all().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_next_collection_appends() {
        let next = next_collection(vec![Book::new("a", "A")], Book::new("b", "B")).unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(next[1].id, "b");
        assert!(next_collection(next, Book::new("a", "Again")).is_none());
    }
}
