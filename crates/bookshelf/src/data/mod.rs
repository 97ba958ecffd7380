//! Data persistence
//!
//! Handles the book model, favorites, settings, and storage backends.

pub mod favorites;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export common types
pub use favorites::{AddResult, FavoritesStore};
pub use settings::Settings;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::Book;
